//! Core GPU context, device management and the crate error type.
//!
//! [`GpuContext`] holds the wgpu resources every other part of the sample
//! talks to: the surface presenting to the window, the device for creating
//! resources, the queue for submitting work, and the surface configuration.
//!
//! [`GpuError`] is the single error type for everything that can go wrong
//! between us and the GPU, from adapter selection to buffer creation.

use std::sync::Arc;
use winit::window::Window;

/// Errors that can occur while talking to the GPU.
#[derive(Debug)]
pub enum GpuError {
    /// The window surface could not be created.
    CreateSurface(wgpu::CreateSurfaceError),
    /// No adapter compatible with the surface was found.
    RequestAdapter(wgpu::RequestAdapterError),
    /// The adapter refused to create a logical device.
    RequestDevice(wgpu::RequestDeviceError),
    /// A buffer could not be created (validation failure or out of memory).
    BufferCreation {
        label: &'static str,
        source: wgpu::Error,
    },
    /// The next surface texture could not be acquired.
    Surface(wgpu::SurfaceError),
}

impl std::fmt::Display for GpuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpuError::CreateSurface(e) => write!(f, "Failed to create surface: {}", e),
            GpuError::RequestAdapter(e) => write!(f, "No suitable GPU adapter: {}", e),
            GpuError::RequestDevice(e) => write!(f, "Failed to create device: {}", e),
            GpuError::BufferCreation { label, source } => {
                write!(f, "Failed to create buffer '{}': {}", label, source)
            }
            GpuError::Surface(e) => write!(f, "Surface error: {}", e),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::CreateSurface(e) => Some(e),
            GpuError::RequestAdapter(e) => Some(e),
            GpuError::RequestDevice(e) => Some(e),
            GpuError::BufferCreation { source, .. } => Some(source),
            GpuError::Surface(e) => Some(e),
        }
    }
}

impl From<wgpu::CreateSurfaceError> for GpuError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        GpuError::CreateSurface(e)
    }
}

impl From<wgpu::RequestAdapterError> for GpuError {
    fn from(e: wgpu::RequestAdapterError) -> Self {
        GpuError::RequestAdapter(e)
    }
}

impl From<wgpu::RequestDeviceError> for GpuError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        GpuError::RequestDevice(e)
    }
}

impl From<wgpu::SurfaceError> for GpuError {
    fn from(e: wgpu::SurfaceError) -> Self {
        GpuError::Surface(e)
    }
}

/// The device, queue and window surface the sample draws with.
///
/// Built once when the window appears and lent to the renderer and to every
/// [`Mesh::render`](crate::mesh::Mesh::render) call.
pub struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    /// Size and format the surface is currently configured with.
    pub config: wgpu::SurfaceConfiguration,
}

/// Whether a resize to `new` should reconfigure a surface of size `current`.
///
/// Minimized windows report a zero dimension and moves report the same size;
/// neither needs new targets.
pub(crate) fn is_resize_needed(current: (u32, u32), new: (u32, u32)) -> bool {
    new.0 != 0 && new.1 != 0 && new != current
}

impl GpuContext {
    /// Bring up wgpu for `window` and configure its surface at the window's size.
    ///
    /// Fails with [`GpuError::CreateSurface`], [`GpuError::RequestAdapter`] or
    /// [`GpuError::RequestDevice`] when the platform cannot give us a device
    /// that can present to this window.
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        log::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Playground Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::debug!(
            "Surface configured: {}x{} {:?}",
            config.width,
            config.height,
            config.format
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Reconfigure the surface for a new window size.
    ///
    /// Returns `false` and leaves the surface alone when
    /// the size is zero in either dimension or unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !is_resize_needed((self.width(), self.height()), (width, height)) {
            return false;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        true
    }

    /// Reapply the current configuration after the surface was lost or outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.config);
    }

    /// Create a buffer with initial contents, reporting validation and
    /// out-of-memory failures instead of deferring them to the device's
    /// uncaptured-error handler.
    pub fn create_buffer_init(
        &self,
        label: &'static str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer, GpuError> {
        use wgpu::util::DeviceExt;

        self.capture(label, || {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage,
                })
        })
    }

    /// Create an uninitialized buffer, reporting failures like
    /// [`create_buffer_init`](Self::create_buffer_init).
    pub fn create_buffer(
        &self,
        label: &'static str,
        size: u64,
        usage: wgpu::BufferUsages,
    ) -> Result<wgpu::Buffer, GpuError> {
        self.capture(label, || {
            self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        })
    }

    fn capture<T>(&self, label: &'static str, create: impl FnOnce() -> T) -> Result<T, GpuError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        match validation.or(out_of_memory) {
            Some(source) => Err(GpuError::BufferCreation { label, source }),
            None => Ok(value),
        }
    }

    /// Returns the current surface width in pixels.
    pub fn width(&self) -> u32 {
        self.config.width
    }

    /// Returns the current surface height in pixels.
    pub fn height(&self) -> u32 {
        self.config.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sized_resizes_are_ignored() {
        assert!(!is_resize_needed((800, 600), (0, 600)));
        assert!(!is_resize_needed((800, 600), (800, 0)));
        assert!(!is_resize_needed((800, 600), (0, 0)));
    }

    #[test]
    fn unchanged_size_is_ignored() {
        assert!(!is_resize_needed((800, 600), (800, 600)));
    }

    #[test]
    fn any_other_size_reconfigures() {
        assert!(is_resize_needed((800, 600), (1024, 600)));
        assert!(is_resize_needed((800, 600), (800, 768)));
        assert!(is_resize_needed((800, 600), (600, 800)));
    }

    #[test]
    fn surface_error_keeps_its_source() {
        let err = GpuError::Surface(wgpu::SurfaceError::Timeout);
        assert!(err.to_string().starts_with("Surface error"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
