//! Off-screen render target allocation: one color + depth pair per
//! committed session, stereo sessions at doubled width (side-by-side).

use tracing::debug;

/// Pixel format of an allocated surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceFormat {
    /// 8-bit-per-channel RGBA color.
    Rgba8Unorm,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

/// How a surface is bound by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceUsage {
    RenderTarget,
    DepthStencil,
}

/// Description of a 2D surface for the device resource factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub sample_count: u32,
    pub format: SurfaceFormat,
    pub usage: SurfaceUsage,
}

impl SurfaceDesc {
    /// Single-sampled color render target.
    pub fn color(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            sample_count: 1,
            format: SurfaceFormat::Rgba8Unorm,
            usage: SurfaceUsage::RenderTarget,
        }
    }

    /// Single-sampled depth/stencil target.
    pub fn depth(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            sample_count: 1,
            format: SurfaceFormat::Depth24Stencil8,
            usage: SurfaceUsage::DepthStencil,
        }
    }
}

/// Device resource factory collaborator. Handles are cheap clones of
/// GPU-side references (the host renders into and transmits from the same
/// surface the session holds). Creation is synchronous; a device-level
/// failure is the only error.
pub trait TargetFactory {
    type Color: Clone;
    type Depth: Clone;
    type Error: std::error::Error;

    fn create_color(&mut self, desc: &SurfaceDesc) -> Result<Self::Color, Self::Error>;
    fn create_depth(&mut self, desc: &SurfaceDesc) -> Result<Self::Depth, Self::Error>;
}

/// Physical surface size for a logical stream size: stereo renders both
/// eyes side by side into one surface, doubling the width.
pub fn physical_extent(width: u32, height: u32, stereo: bool) -> (u32, u32) {
    if stereo {
        (width * 2, height)
    } else {
        (width, height)
    }
}

/// Allocate the color + depth pair for a session. Nothing is kept on
/// failure: either both surfaces exist or neither does.
pub fn allocate_target_pair<F: TargetFactory>(
    factory: &mut F,
    width: u32,
    height: u32,
    stereo: bool,
) -> Result<(F::Color, F::Depth), F::Error> {
    let (w, h) = physical_extent(width, height, stereo);
    let color = factory.create_color(&SurfaceDesc::color(w, h))?;
    let depth = factory.create_depth(&SurfaceDesc::depth(w, h))?;
    debug!(width = w, height = h, stereo, "allocated render target pair");
    Ok((color, depth))
}
