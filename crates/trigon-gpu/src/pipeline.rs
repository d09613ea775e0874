//! Render pass and graphics pipeline construction.

use crate::error::{GpuError, Result};
use ash::vk;

/// Everything the pipeline build needs from earlier bring-up stages.
pub struct PipelineConfig {
    pub vertex_spirv: Vec<u32>,
    pub fragment_spirv: Vec<u32>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

/// A viewport covering `extent` exactly, full depth range.
pub fn viewport_for_extent(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport::default()
        .x(0.0)
        .y(0.0)
        .width(extent.width as f32)
        .height(extent.height as f32)
        .min_depth(0.0)
        .max_depth(1.0)
}

/// Single-subpass render pass over one color attachment: cleared on load,
/// stored, transitioned from undefined to present-ready.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_render_pass(device: &ash::Device, format: vk::Format) -> Result<vk::RenderPass> {
    let attachment = vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

    let color_ref = vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(std::slice::from_ref(&color_ref));

    // Hold the layout transition until the acquire semaphore lets color
    // output begin.
    let dependency = vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(std::slice::from_ref(&attachment))
        .subpasses(std::slice::from_ref(&subpass))
        .dependencies(std::slice::from_ref(&dependency));

    let render_pass = device.create_render_pass(&create_info, None)?;
    Ok(render_pass)
}

/// Graphics pipeline with its render pass and (empty) layout.
///
/// Depends on the presentation chain's format and extent; both are fixed for
/// the pipeline's lifetime.
pub struct Pipeline {
    pub render_pass: vk::RenderPass,
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
    extent: vk::Extent2D,
}

impl Pipeline {
    /// Build the fixed-function and programmable state against the
    /// presentation format and extent.
    ///
    /// Shader modules are transient: created here, referenced by the build,
    /// and destroyed before returning.
    ///
    /// # Safety
    /// The device must be valid and the shader words must be valid SPIR-V.
    pub unsafe fn new(device: &ash::Device, config: &PipelineConfig) -> Result<Self> {
        let render_pass = create_render_pass(device, config.format)?;

        let vert_info = vk::ShaderModuleCreateInfo::default().code(&config.vertex_spirv);
        let vert_module = match device.create_shader_module(&vert_info, None) {
            Ok(module) => module,
            Err(e) => {
                device.destroy_render_pass(render_pass, None);
                return Err(GpuError::ShaderCompilation(format!("vertex: {e}")));
            }
        };

        let frag_info = vk::ShaderModuleCreateInfo::default().code(&config.fragment_spirv);
        let frag_module = match device.create_shader_module(&frag_info, None) {
            Ok(module) => module,
            Err(e) => {
                device.destroy_shader_module(vert_module, None);
                device.destroy_render_pass(render_pass, None);
                return Err(GpuError::ShaderCompilation(format!("fragment: {e}")));
            }
        };

        let result = Self::build(device, config, render_pass, vert_module, frag_module);

        device.destroy_shader_module(vert_module, None);
        device.destroy_shader_module(frag_module, None);

        match result {
            Ok((layout, pipeline)) => Ok(Self {
                render_pass,
                layout,
                pipeline,
                extent: config.extent,
            }),
            Err(e) => {
                device.destroy_render_pass(render_pass, None);
                Err(e)
            }
        }
    }

    unsafe fn build(
        device: &ash::Device,
        config: &PipelineConfig,
        render_pass: vk::RenderPass,
        vert_module: vk::ShaderModule,
        frag_module: vk::ShaderModule,
    ) -> Result<(vk::PipelineLayout, vk::Pipeline)> {
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vert_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(frag_module)
                .name(c"main"),
        ];

        // No per-vertex attributes: positions are generated in the vertex
        // shader.
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default();

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // Static viewport and scissor matching the presentation extent.
        let viewport = viewport_for_extent(config.extent);
        let scissor = vk::Rect2D::default().extent(config.extent);
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(std::slice::from_ref(&viewport))
            .scissors(std::slice::from_ref(&scissor));

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false)
            .line_width(1.0);

        let multisampling = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1)
            .sample_shading_enable(false);

        // Straight overwrite of the color attachment.
        let blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA);
        let color_blending = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(std::slice::from_ref(&blend_attachment));

        // No descriptor sets, no push constants.
        let layout_info = vk::PipelineLayoutCreateInfo::default();
        let layout = device
            .create_pipeline_layout(&layout_info, None)
            .map_err(|e| GpuError::PipelineCreation(e.to_string()))?;

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisampling)
            .color_blend_state(&color_blending)
            .layout(layout)
            .render_pass(render_pass)
            .subpass(0);

        let pipelines = match device.create_graphics_pipelines(
            vk::PipelineCache::null(),
            &[pipeline_info],
            None,
        ) {
            Ok(pipelines) => pipelines,
            Err((_pipelines, e)) => {
                device.destroy_pipeline_layout(layout, None);
                return Err(GpuError::PipelineCreation(e.to_string()));
            }
        };

        Ok((layout, pipelines[0]))
    }

    /// The viewport the pipeline was configured with.
    pub fn viewport(&self) -> vk::Viewport {
        viewport_for_extent(self.extent)
    }

    /// Destroy the pipeline, its render pass, and its layout.
    ///
    /// # Safety
    /// The device must be valid and the pipeline must not be in use.
    pub unsafe fn destroy(&self, device: &ash::Device) {
        device.destroy_pipeline(self.pipeline, None);
        device.destroy_render_pass(self.render_pass, None);
        device.destroy_pipeline_layout(self.layout, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swapchain::select_extent;

    fn pipeline_with_extent(extent: vk::Extent2D) -> Pipeline {
        Pipeline {
            render_pass: vk::RenderPass::null(),
            layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
            extent,
        }
    }

    #[test]
    fn configured_viewport_round_trips_the_extent() {
        let pipeline = pipeline_with_extent(vk::Extent2D {
            width: 1024,
            height: 768,
        });
        let viewport = pipeline.viewport();
        assert_eq!(viewport.x, 0.0);
        assert_eq!(viewport.y, 0.0);
        assert_eq!(viewport.width, 1024.0);
        assert_eq!(viewport.height, 768.0);
        assert_eq!(viewport.min_depth, 0.0);
        assert_eq!(viewport.max_depth, 1.0);
    }

    #[test]
    fn sentinel_surface_size_flows_into_the_viewport() {
        // The surface defers sizing, so the configured 800x600 window size
        // decides the extent, and the pipeline's viewport must match it.
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            ..Default::default()
        };
        let extent = select_extent(
            &capabilities,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(
            extent,
            vk::Extent2D {
                width: 800,
                height: 600,
            }
        );

        let viewport = pipeline_with_extent(extent).viewport();
        assert_eq!(viewport.width, 800.0);
        assert_eq!(viewport.height, 600.0);
    }
}
