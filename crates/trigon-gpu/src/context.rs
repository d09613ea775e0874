//! The render context aggregate: staged bring-up and ordered teardown.
//!
//! Bring-up is a linear chain where every stage consumes handles produced by
//! the previous one, and any failure aborts the whole sequence with an error
//! naming the stage. Teardown walks the dependency graph in reverse, guarded
//! per stage, so a partially constructed graph destroys exactly what exists.

use crate::capabilities::SwapchainSupport;
use crate::device::{create_device, select_adapter};
use crate::error::{GpuError, Result};
use crate::frame::FrameResources;
use crate::instance::{create_instance, log_available_extensions, DebugMessenger, DiagnosticsLevel};
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::surface::SurfaceContext;
use crate::swapchain::{select_extent, select_present_mode, select_surface_format, Swapchain};
use crate::sync::FrameSync;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// Bring-up stages, in construction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringupStage {
    Instance,
    Diagnostics,
    Surface,
    Device,
    Swapchain,
    Pipeline,
    FrameResources,
    Sync,
}

/// Destruction schedule: reverse dependency order. The diagnostics
/// messenger is independent of the device chain and goes first.
pub const TEARDOWN_ORDER: [BringupStage; 8] = [
    BringupStage::Diagnostics,
    BringupStage::Sync,
    BringupStage::FrameResources,
    BringupStage::Pipeline,
    BringupStage::Swapchain,
    BringupStage::Surface,
    BringupStage::Device,
    BringupStage::Instance,
];

/// The subset of [`TEARDOWN_ORDER`] applicable to a partially built graph.
pub fn teardown_plan(created: &[BringupStage]) -> Vec<BringupStage> {
    TEARDOWN_ORDER
        .iter()
        .copied()
        .filter(|stage| created.contains(stage))
        .collect()
}

/// Bring-up state while stages are still running.
///
/// Every component is optional; `teardown` destroys whatever was created and
/// touches nothing else.
struct PartialBringup {
    entry: ash::Entry,
    instance: Option<ash::Instance>,
    debug: Option<DebugMessenger>,
    surface: Option<SurfaceContext>,
    device: Option<ash::Device>,
    queue: vk::Queue,
    swapchain_loader: Option<ash::khr::swapchain::Device>,
    swapchain: Option<Swapchain>,
    pipeline: Option<Pipeline>,
    frames: Option<FrameResources>,
    sync: Option<FrameSync>,
}

impl PartialBringup {
    /// Load the Vulkan entry points; everything else starts absent.
    ///
    /// # Safety
    /// A Vulkan loader must be present on the system.
    unsafe fn load() -> Result<Self> {
        let entry = ash::Entry::load()
            .map_err(|e| GpuError::EntryLoading(e.to_string()).at_stage(BringupStage::Instance))?;

        Ok(Self {
            entry,
            instance: None,
            debug: None,
            surface: None,
            device: None,
            queue: vk::Queue::null(),
            swapchain_loader: None,
            swapchain: None,
            pipeline: None,
            frames: None,
            sync: None,
        })
    }

    fn created_stages(&self) -> Vec<BringupStage> {
        let mut created = Vec::new();
        if self.instance.is_some() {
            created.push(BringupStage::Instance);
        }
        if self.debug.is_some() {
            created.push(BringupStage::Diagnostics);
        }
        if self.surface.is_some() {
            created.push(BringupStage::Surface);
        }
        if self.device.is_some() {
            created.push(BringupStage::Device);
        }
        if self.swapchain.is_some() {
            created.push(BringupStage::Swapchain);
        }
        if self.pipeline.is_some() {
            created.push(BringupStage::Pipeline);
        }
        if self.frames.is_some() {
            created.push(BringupStage::FrameResources);
        }
        if self.sync.is_some() {
            created.push(BringupStage::Sync);
        }
        created
    }

    /// Destroy everything created so far, in teardown order.
    ///
    /// # Safety
    /// No GPU work may be submitted against these handles afterwards.
    unsafe fn teardown(&mut self) {
        if let Some(device) = &self.device {
            if let Err(e) = device.device_wait_idle() {
                tracing::warn!("device_wait_idle during teardown failed: {e}");
            }
        }

        for stage in teardown_plan(&self.created_stages()) {
            self.destroy_stage(stage);
        }
    }

    unsafe fn destroy_stage(&mut self, stage: BringupStage) {
        match stage {
            BringupStage::Diagnostics => {
                if let Some(debug) = self.debug.take() {
                    debug.destroy();
                }
            }
            BringupStage::Sync => {
                if let (Some(sync), Some(device)) = (self.sync.take(), self.device.as_ref()) {
                    sync.destroy(device);
                }
            }
            BringupStage::FrameResources => {
                if let (Some(frames), Some(device)) = (self.frames.take(), self.device.as_ref()) {
                    frames.destroy(device);
                }
            }
            BringupStage::Pipeline => {
                if let (Some(pipeline), Some(device)) =
                    (self.pipeline.take(), self.device.as_ref())
                {
                    pipeline.destroy(device);
                }
            }
            BringupStage::Swapchain => {
                if let (Some(swapchain), Some(loader), Some(device)) = (
                    self.swapchain.take(),
                    self.swapchain_loader.as_ref(),
                    self.device.as_ref(),
                ) {
                    swapchain.destroy(device, loader);
                }
            }
            BringupStage::Surface => {
                if let Some(surface) = self.surface.take() {
                    surface.destroy();
                }
            }
            BringupStage::Device => {
                if let Some(device) = self.device.take() {
                    device.destroy_device(None);
                }
            }
            BringupStage::Instance => {
                if let Some(instance) = self.instance.take() {
                    instance.destroy_instance(None);
                }
            }
        }
    }

    /// Convert a completed bring-up into the final context.
    fn finish(&mut self) -> Result<RenderContext> {
        let (
            Some(instance),
            Some(surface),
            Some(device),
            Some(swapchain_loader),
            Some(swapchain),
            Some(pipeline),
            Some(frames),
            Some(sync),
        ) = (
            self.instance.take(),
            self.surface.take(),
            self.device.take(),
            self.swapchain_loader.take(),
            self.swapchain.take(),
            self.pipeline.take(),
            self.frames.take(),
            self.sync.take(),
        )
        else {
            return Err(GpuError::InvalidState(
                "bring-up finished with missing components".into(),
            ));
        };

        Ok(RenderContext {
            entry: self.entry.clone(),
            instance,
            debug: self.debug.take(),
            surface,
            device,
            queue: self.queue,
            swapchain_loader,
            swapchain,
            pipeline,
            frames,
            sync,
            torn_down: false,
        })
    }
}

/// Staged builder producing a fully constructed [`RenderContext`].
pub struct RenderContextBuilder {
    app_name: String,
    fallback_extent: vk::Extent2D,
    diagnostics: DiagnosticsLevel,
    vertex_spirv: Vec<u32>,
    fragment_spirv: Vec<u32>,
}

impl Default for RenderContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Trigon".to_string(),
            fallback_extent: vk::Extent2D {
                width: 800,
                height: 600,
            },
            diagnostics: DiagnosticsLevel::default_for_build(),
            vertex_spirv: Vec::new(),
            fragment_spirv: Vec::new(),
        }
    }
}

impl RenderContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Extent used when the surface lets the window decide its size.
    pub fn fallback_extent(mut self, width: u32, height: u32) -> Self {
        self.fallback_extent = vk::Extent2D { width, height };
        self
    }

    /// Set the diagnostics level.
    pub fn diagnostics(mut self, level: DiagnosticsLevel) -> Self {
        self.diagnostics = level;
        self
    }

    /// Provide the decoded vertex and fragment shader words.
    pub fn shaders(mut self, vertex_spirv: Vec<u32>, fragment_spirv: Vec<u32>) -> Self {
        self.vertex_spirv = vertex_spirv;
        self.fragment_spirv = fragment_spirv;
        self
    }

    /// Run the bring-up chain against `window`.
    ///
    /// On failure the partially constructed graph is torn down before the
    /// tagged error is returned.
    pub fn build<W>(self, window: &W) -> Result<RenderContext>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let mut partial = unsafe { PartialBringup::load() }?;

        match unsafe { self.run_stages(&mut partial, window) } {
            Ok(()) => partial.finish(),
            Err(e) => {
                tracing::error!("Bring-up aborted: {e}");
                unsafe { partial.teardown() };
                Err(e)
            }
        }
    }

    unsafe fn run_stages<W>(self, partial: &mut PartialBringup, window: &W) -> Result<()>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        // Instance: the windowing system supplies its required extensions.
        let display = window
            .display_handle()
            .map_err(|e| {
                GpuError::SurfaceCreation(format!("display handle: {e}"))
                    .at_stage(BringupStage::Instance)
            })?;
        let window_extensions = ash_window::enumerate_required_extensions(display.as_raw())
            .map_err(|e| GpuError::from(e).at_stage(BringupStage::Instance))?;

        if self.diagnostics.enabled() {
            if let Err(e) = log_available_extensions(&partial.entry) {
                tracing::debug!("Could not enumerate instance extensions: {e}");
            }
        }

        let instance = create_instance(
            &partial.entry,
            &self.app_name,
            window_extensions,
            self.diagnostics,
        )
        .map_err(|e| e.at_stage(BringupStage::Instance))?;
        let instance = partial.instance.insert(instance);

        // Diagnostics messenger: absence degrades, never fails bring-up.
        if self.diagnostics.enabled() {
            match DebugMessenger::new(&partial.entry, instance, self.diagnostics) {
                Ok(messenger) => partial.debug = Some(messenger),
                Err(e) => tracing::warn!("Diagnostics messenger unavailable: {e}"),
            }
        }

        // Surface.
        let surface = SurfaceContext::from_window(&partial.entry, instance, window)
            .map_err(|e| e.at_stage(BringupStage::Surface))?;
        let surface = partial.surface.insert(surface);

        // Adapter and logical device.
        let selected = select_adapter(instance, &surface.surface_loader, surface.surface)
            .map_err(|e| e.at_stage(BringupStage::Device))?;

        let (device, queue) = create_device(instance, selected.adapter, selected.queue_family)
            .map_err(|e| e.at_stage(BringupStage::Device))?;
        partial.queue = queue;
        let device = partial.device.insert(device);

        // Presentation chain.
        let support = SwapchainSupport::query(&surface.surface_loader, selected.adapter, surface.surface)
            .map_err(|e| e.at_stage(BringupStage::Swapchain))?;
        if !support.is_adequate() {
            return Err(GpuError::SwapchainCreation(
                "adapter lost its surface formats or present modes".into(),
            )
            .at_stage(BringupStage::Swapchain));
        }

        let surface_format = select_surface_format(&support.formats);
        let present_mode = select_present_mode(&support.present_modes);
        let extent = select_extent(&support.capabilities, self.fallback_extent);

        let swapchain_loader = partial
            .swapchain_loader
            .insert(ash::khr::swapchain::Device::new(instance, device));
        let swapchain = Swapchain::new(
            device,
            swapchain_loader,
            surface.surface,
            &support.capabilities,
            surface_format,
            present_mode,
            extent,
            selected.queue_family,
        )
        .map_err(|e| e.at_stage(BringupStage::Swapchain))?;
        let swapchain = partial.swapchain.insert(swapchain);

        // Graphics pipeline.
        if self.vertex_spirv.is_empty() || self.fragment_spirv.is_empty() {
            return Err(GpuError::InvalidState(
                "pipeline requires vertex and fragment shader words".into(),
            )
            .at_stage(BringupStage::Pipeline));
        }

        let pipeline_config = PipelineConfig {
            vertex_spirv: self.vertex_spirv,
            fragment_spirv: self.fragment_spirv,
            format: swapchain.format,
            extent: swapchain.extent,
        };
        let pipeline = Pipeline::new(device, &pipeline_config)
            .map_err(|e| e.at_stage(BringupStage::Pipeline))?;
        let pipeline = partial.pipeline.insert(pipeline);

        // Framebuffers and pre-recorded command buffers.
        let frames = FrameResources::new(
            device,
            &swapchain.image_views,
            pipeline,
            swapchain.extent,
            selected.queue_family,
        )
        .map_err(|e| e.at_stage(BringupStage::FrameResources))?;
        partial.frames = Some(frames);

        // Frame synchronization.
        let sync = FrameSync::new(device).map_err(|e| e.at_stage(BringupStage::Sync))?;
        partial.sync = Some(sync);

        Ok(())
    }
}

/// The fully constructed rendering object graph.
///
/// Produced only by [`RenderContextBuilder`]; every component below is live
/// until [`RenderContext::teardown`] runs.
pub struct RenderContext {
    // Entry must outlive every loader created from it.
    #[allow(dead_code)]
    entry: ash::Entry,
    instance: ash::Instance,
    debug: Option<DebugMessenger>,
    surface: SurfaceContext,
    device: ash::Device,
    queue: vk::Queue,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: Swapchain,
    pipeline: Pipeline,
    frames: FrameResources,
    sync: FrameSync,
    torn_down: bool,
}

impl RenderContext {
    /// Get the logical device.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Get the combined graphics/present queue.
    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    /// Get the presentation chain.
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Get the swapchain extension loader.
    pub fn swapchain_loader(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain_loader
    }

    /// Get the per-image frame resources.
    pub fn frames(&self) -> &FrameResources {
        &self.frames
    }

    /// Get the frame synchronization primitives.
    pub fn sync(&self) -> &FrameSync {
        &self.sync
    }

    /// Destroy the whole object graph in [`TEARDOWN_ORDER`], waiting for the
    /// device to go idle first.
    ///
    /// Safe to call more than once; later calls are no-ops. Dropping the
    /// context runs this if the caller has not.
    ///
    /// # Safety
    /// No GPU work may be submitted against this context afterwards.
    pub unsafe fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Err(e) = self.device.device_wait_idle() {
            tracing::warn!("device_wait_idle before teardown failed: {e}");
        }

        if let Some(debug) = self.debug.take() {
            debug.destroy();
        }
        self.sync.destroy(&self.device);
        self.frames.destroy(&self.device);
        self.pipeline.destroy(&self.device);
        self.swapchain.destroy(&self.device, &self.swapchain_loader);
        self.surface.destroy();
        self.device.destroy_device(None);
        self.instance.destroy_instance(None);

        tracing::info!("Render context torn down");
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        unsafe { self.teardown() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_teardown_is_the_whole_schedule() {
        let all = [
            BringupStage::Instance,
            BringupStage::Diagnostics,
            BringupStage::Surface,
            BringupStage::Device,
            BringupStage::Swapchain,
            BringupStage::Pipeline,
            BringupStage::FrameResources,
            BringupStage::Sync,
        ];
        assert_eq!(teardown_plan(&all), TEARDOWN_ORDER.to_vec());
    }

    #[test]
    fn partial_graph_tears_down_only_what_exists() {
        let plan = teardown_plan(&[BringupStage::Instance, BringupStage::Device]);
        assert_eq!(plan, vec![BringupStage::Device, BringupStage::Instance]);
    }

    #[test]
    fn empty_graph_needs_no_teardown() {
        assert!(teardown_plan(&[]).is_empty());
    }

    #[test]
    fn device_outlives_everything_it_created() {
        let position = |stage| {
            TEARDOWN_ORDER
                .iter()
                .position(|s| *s == stage)
                .expect("stage missing from schedule")
        };

        let device_at = position(BringupStage::Device);
        for dependent in [
            BringupStage::Sync,
            BringupStage::FrameResources,
            BringupStage::Pipeline,
            BringupStage::Swapchain,
        ] {
            assert!(position(dependent) < device_at);
        }
        assert!(device_at < position(BringupStage::Instance));
    }
}
