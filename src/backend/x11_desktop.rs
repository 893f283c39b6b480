use std::ffi::c_void;
use std::fmt::Display;
use std::num::{NonZeroU32, NonZeroU64};
use std::ptr::NonNull;
use std::sync::Arc;

use as_raw_xcb_connection::AsRawXcbConnection;
use bytemuck::{Pod, Zeroable};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, XcbDisplayHandle, XcbWindowHandle};
use wgpu::util::DeviceExt;
use x11rb::connection::Connection;
use x11rb::protocol::xinerama::ConnectionExt as _;
use x11rb::protocol::xproto::{
    AtomEnum, Colormap, ColormapAlloc, ColormapWrapper, ConnectionExt as _, CreateWindowAux,
    EventMask, PropMode, Screen, VisualClass, Visualid, Window, WindowClass, WindowWrapper,
};
use x11rb::wrapper::ConnectionExt as _;
use x11rb::xcb_ffi::XCBConnection;

use crate::backend::DesktopBackend;
use crate::config::DesktopCubeConfig;
use crate::error::{RenderError, Result};
use crate::monitor::{MonitorInfo, desktop_extent};
use crate::scene::{
    CUBE_COLORS, CUBE_INDEX_COUNT, CUBE_VERTICES, MonitorDraw, triangulated_indices,
};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
const COLOR_DEPTH_BITS: u8 = 24;

const CUBE_SHADER_WGSL: &str = r#"
struct CubeUniform {
    mvp: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> cube: CubeUniform;

struct VsOut {
    @builtin(position) pos: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @location(1) color: vec4<f32>) -> VsOut {
    var out: VsOut;
    out.pos = cube.mvp * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    return in.color;
}
"#;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x4];

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct CubeUniform {
    mvp: [[f32; 4]; 4],
}

#[derive(Default)]
pub struct X11DesktopBackend {
    session: Option<X11Session>,
    frame_index: u64,
    warned_offscreen: bool,
}

/// Everything acquired during bootstrap.
///
/// Fields drop top to bottom: GPU objects first, then the surface and device, then
/// the colormap and window, and the connection last once no wrapper holds it.
struct X11Session {
    scene: CubeScene,
    gpu: GpuContext,
    _colormap: ColormapWrapper<Arc<XCBConnection>>,
    _window: WindowWrapper<Arc<XCBConnection>>,
    monitors: Vec<MonitorInfo>,
    connection: Arc<XCBConnection>,
}

struct GpuContext {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
    _adapter: wgpu::Adapter,
    _instance: wgpu::Instance,
}

struct CubeScene {
    vertex_buffer: wgpu::Buffer,
    color_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    msaa_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    uniform_stride: u64,
    uniform_slots: usize,
    clear_color: wgpu::Color,
}

fn refused<E: Display>(what: &'static str) -> impl FnOnce(E) -> RenderError {
    move |err| RenderError::ResourceCreation(format!("{what}: {err}"))
}

fn enumeration<E: Display>(what: &'static str) -> impl FnOnce(E) -> RenderError {
    move |err| RenderError::Enumeration(format!("{what}: {err}"))
}

impl DesktopBackend for X11DesktopBackend {
    fn name(&self) -> &'static str {
        "x11-desktop"
    }

    fn bootstrap(&mut self, config: &DesktopCubeConfig) -> Result<()> {
        let (connection, screen_num) = XCBConnection::connect(None)
            .map_err(|err| RenderError::Connection(format!("failed to open X display: {err}")))?;
        let connection = Arc::new(connection);
        log::debug!("connected to X server (screen {screen_num})");

        let monitors = query_monitors(&connection)?;
        let (width, height) = desktop_extent(&monitors);
        let (window_width, window_height) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(RenderError::Capability(format!(
                    "desktop extent {width}x{height} does not fit an X11 window"
                )));
            }
        };
        log::debug!(
            "{} monitor(s), desktop extent {width}x{height}",
            monitors.len()
        );

        let screen = connection
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| RenderError::Connection(format!("invalid X11 screen {screen_num}")))?;
        let root = screen.root;
        let visual = pick_visual(screen)?;
        log::debug!("selected {COLOR_DEPTH_BITS}-bit TrueColor visual {visual:#x}");

        let colormap = create_colormap(&connection, root, visual)?;
        let window = create_desktop_window(
            &connection,
            root,
            visual,
            colormap.colormap(),
            (window_width, window_height),
            config.window_title,
        )?;

        let gpu = GpuContext::new(&connection, screen_num, window.window(), width, height)?;
        let scene = CubeScene::new(&gpu, config, monitors.len())?;

        log::info!(
            "[backend:{}] desktop window {:#x} {}x{} monitors={} format={:?} msaa={}x",
            self.name(),
            window.window(),
            width,
            height,
            monitors.len(),
            gpu.config.format,
            config.msaa_samples
        );

        self.session = Some(X11Session {
            scene,
            gpu,
            _colormap: colormap,
            _window: window,
            monitors,
            connection,
        });
        self.frame_index = 0;
        Ok(())
    }

    fn discover_monitors(&mut self) -> Result<Vec<MonitorInfo>> {
        let session = self.session.as_ref().ok_or_else(|| {
            RenderError::Enumeration("backend not bootstrapped".to_string())
        })?;
        Ok(session.monitors.clone())
    }

    fn render_frame(&mut self, draws: &[MonitorDraw]) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            return Err(RenderError::Surface("backend not bootstrapped".to_string()));
        };

        drain_events(&session.connection);

        let gpu = &session.gpu;
        let frame = match gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost/outdated; reconfiguring and skipping frame");
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("surface acquire timeout");
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(RenderError::Surface("out of memory".to_string()));
            }
            Err(wgpu::SurfaceError::Other) => {
                log::debug!("surface acquire failed; skipping frame");
                return Ok(());
            }
        };

        let scene = &session.scene;
        let slots = draws.len().min(scene.uniform_slots);
        for (slot, draw) in draws.iter().take(slots).enumerate() {
            let uniform = CubeUniform {
                mvp: draw.mvp.to_cols_array_2d(),
            };
            gpu.queue.write_buffer(
                &scene.uniform_buffer,
                slot as u64 * scene.uniform_stride,
                bytemuck::bytes_of(&uniform),
            );
        }

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("desktop-cube-frame-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("desktop-cube-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &scene.msaa_view,
                    resolve_target: Some(&view),
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.clear_color),
                        store: wgpu::StoreOp::Discard,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &scene.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&scene.pipeline);
            pass.set_vertex_buffer(0, scene.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, scene.color_buffer.slice(..));
            pass.set_index_buffer(scene.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

            for (slot, draw) in draws.iter().take(slots).enumerate() {
                let Some(vp) = draw.viewport.clip_to(gpu.config.width, gpu.config.height) else {
                    if !self.warned_offscreen {
                        log::warn!(
                            "monitor viewport {:?} lies outside the {}x{} window; skipping it",
                            draw.viewport,
                            gpu.config.width,
                            gpu.config.height
                        );
                        self.warned_offscreen = true;
                    }
                    continue;
                };
                pass.set_viewport(
                    vp.x as f32,
                    vp.y as f32,
                    vp.width as f32,
                    vp.height as f32,
                    0.0,
                    1.0,
                );
                let offset = (slot as u64 * scene.uniform_stride) as wgpu::DynamicOffset;
                pass.set_bind_group(0, &scene.bind_group, &[offset]);
                pass.draw_indexed(0..CUBE_INDEX_COUNT, 0, 0..1);
            }
        }

        gpu.queue.submit([encoder.finish()]);
        frame.present();
        session
            .connection
            .flush()
            .map_err(|err| RenderError::Connection(format!("X11 flush failed: {err}")))?;

        self.frame_index = self.frame_index.wrapping_add(1);
        if self.frame_index % 600 == 0 {
            log::debug!(
                "[backend:{}] frame={} draws={}",
                self.name(),
                self.frame_index,
                slots
            );
        }
        Ok(())
    }
}

fn query_monitors(connection: &XCBConnection) -> Result<Vec<MonitorInfo>> {
    let active = connection
        .xinerama_is_active()
        .map_err(enumeration("xinerama is_active"))?
        .reply()
        .map_err(enumeration("xinerama is_active"))?;
    if active.state == 0 {
        return Err(RenderError::Enumeration(
            "xinerama is not active on this display".to_string(),
        ));
    }

    let screens = connection
        .xinerama_query_screens()
        .map_err(enumeration("xinerama query_screens"))?
        .reply()
        .map_err(enumeration("xinerama query_screens"))?
        .screen_info;
    if screens.is_empty() {
        return Err(RenderError::Enumeration(
            "xinerama reported no screens".to_string(),
        ));
    }

    Ok(screens
        .iter()
        .map(|s| MonitorInfo::new(s.x_org, s.y_org, s.width, s.height))
        .collect())
}

/// 24-bit TrueColor with 8 bits per channel, preferring the root visual.
fn pick_visual(screen: &Screen) -> Result<Visualid> {
    let candidates = screen
        .allowed_depths
        .iter()
        .filter(|depth| depth.depth == COLOR_DEPTH_BITS)
        .flat_map(|depth| depth.visuals.iter())
        .filter(|visual| visual.class == VisualClass::TRUE_COLOR && visual.bits_per_rgb_value == 8)
        .map(|visual| visual.visual_id)
        .collect::<Vec<_>>();

    candidates
        .iter()
        .copied()
        .find(|id| *id == screen.root_visual)
        .or_else(|| candidates.first().copied())
        .ok_or_else(|| {
            RenderError::Capability("no 24-bit TrueColor visual available".to_string())
        })
}

fn create_colormap(
    connection: &Arc<XCBConnection>,
    root: Window,
    visual: Visualid,
) -> Result<ColormapWrapper<Arc<XCBConnection>>> {
    let id = connection.generate_id().map_err(refused("colormap id"))?;
    connection
        .create_colormap(ColormapAlloc::NONE, id, root, visual)
        .map_err(refused("create_colormap"))?
        .check()
        .map_err(refused("create_colormap"))?;

    Ok(ColormapWrapper::for_colormap(Arc::clone(connection), id))
}

fn create_desktop_window(
    connection: &Arc<XCBConnection>,
    root: Window,
    visual: Visualid,
    colormap: Colormap,
    (width, height): (u16, u16),
    title: &str,
) -> Result<WindowWrapper<Arc<XCBConnection>>> {
    let id = connection.generate_id().map_err(refused("window id"))?;
    let aux = CreateWindowAux::new()
        .colormap(colormap)
        .border_pixel(0)
        .event_mask(EventMask::EXPOSURE | EventMask::KEY_PRESS);
    connection
        .create_window(
            COLOR_DEPTH_BITS,
            id,
            root,
            0,
            0,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &aux,
        )
        .map_err(refused("create_window"))?
        .check()
        .map_err(refused("create_window"))?;

    let window = WindowWrapper::for_window(Arc::clone(connection), id);

    connection
        .change_property8(
            PropMode::REPLACE,
            id,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )
        .map_err(refused("WM_NAME"))?;

    let window_type = intern(connection, b"_NET_WM_WINDOW_TYPE")?;
    let desktop_type = intern(connection, b"_NET_WM_WINDOW_TYPE_DESKTOP")?;
    connection
        .change_property32(
            PropMode::REPLACE,
            id,
            window_type,
            AtomEnum::ATOM,
            &[desktop_type],
        )
        .map_err(refused("_NET_WM_WINDOW_TYPE"))?;

    connection.map_window(id).map_err(refused("map_window"))?;
    connection.flush().map_err(refused("flush"))?;
    log::debug!("mapped desktop window {id:#x} ({width}x{height})");
    Ok(window)
}

fn intern(connection: &XCBConnection, name: &'static [u8]) -> Result<u32> {
    Ok(connection
        .intern_atom(false, name)
        .map_err(refused("intern_atom"))?
        .reply()
        .map_err(refused("intern_atom"))?
        .atom)
}

/// Exposure and key events are selected but have no effect; keep the queue empty.
fn drain_events(connection: &XCBConnection) {
    loop {
        match connection.poll_for_event() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(err) => {
                log::warn!("X11 poll_for_event failed: {err}");
                break;
            }
        }
    }
}

impl GpuContext {
    fn new(
        connection: &XCBConnection,
        screen_num: usize,
        window: Window,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let connection_ptr = NonNull::new(connection.as_raw_xcb_connection().cast::<c_void>())
            .ok_or_else(|| RenderError::Connection("xcb connection pointer is null".to_string()))?;
        let window_id = NonZeroU32::new(window)
            .ok_or_else(|| RenderError::ResourceCreation("window id is zero".to_string()))?;
        let raw_display_handle =
            RawDisplayHandle::Xcb(XcbDisplayHandle::new(Some(connection_ptr), screen_num as i32));
        let raw_window_handle = RawWindowHandle::Xcb(XcbWindowHandle::new(window_id));

        let instance = wgpu::Instance::default();
        // SAFETY: the connection and window are owned by the same X11Session and are
        // declared after the surface, so both outlive it.
        let surface = unsafe {
            instance
                .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                    raw_display_handle,
                    raw_window_handle,
                })
                .map_err(refused("wgpu surface"))?
        };

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::Capability("no GPU adapter for this surface".to_string()))?;
        let adapter_limits = adapter.limits();

        let max_dim = adapter_limits.max_texture_dimension_2d;
        if width > max_dim || height > max_dim {
            return Err(RenderError::Capability(format!(
                "desktop extent {width}x{height} exceeds max texture dimension {max_dim}"
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("desktop-cube-device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter_limits,
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|err| RenderError::Capability(format!("wgpu request_device failed: {err}")))?;

        let caps = surface.get_capabilities(&adapter);
        let format = pick_surface_format(&caps.formats).ok_or_else(|| {
            RenderError::Capability(format!(
                "no 8-bit RGBA surface format among {:?}",
                caps.formats
            ))
        })?;
        for (label, fmt) in [("surface", format), ("depth", DEPTH_FORMAT)] {
            if !adapter
                .get_texture_format_features(fmt)
                .flags
                .sample_count_supported(4)
            {
                return Err(RenderError::Capability(format!(
                    "4x multisampling unsupported for {label} format {fmt:?}"
                )));
            }
        }
        let alpha_mode = caps
            .alpha_modes
            .iter()
            .copied()
            .find(|m| *m == wgpu::CompositeAlphaMode::Opaque)
            .or_else(|| caps.alpha_modes.first().copied())
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            config,
            device,
            queue,
            _adapter: adapter,
            _instance: instance,
        })
    }
}

/// Linear formats keep the palette at its hex values; sRGB is the fallback.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat::{Bgra8Unorm, Bgra8UnormSrgb, Rgba8Unorm, Rgba8UnormSrgb};
    formats
        .iter()
        .copied()
        .find(|f| matches!(f, Bgra8Unorm | Rgba8Unorm))
        .or_else(|| {
            formats
                .iter()
                .copied()
                .find(|f| matches!(f, Bgra8UnormSrgb | Rgba8UnormSrgb))
        })
}

/// Byte distance between per-monitor uniforms, honouring the device's offset alignment.
fn uniform_stride(min_alignment: u32) -> u64 {
    let size = std::mem::size_of::<CubeUniform>() as u64;
    let align = u64::from(min_alignment.max(1));
    size.div_ceil(align) * align
}

impl CubeScene {
    fn new(gpu: &GpuContext, config: &DesktopCubeConfig, monitors: usize) -> Result<Self> {
        let device = &gpu.device;
        let samples = config.msaa_samples;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("desktop-cube-vertices"),
            contents: bytemuck::cast_slice(&CUBE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("desktop-cube-indices"),
            contents: bytemuck::cast_slice(&triangulated_indices()),
            usage: wgpu::BufferUsages::INDEX,
        });
        let color_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("desktop-cube-colors"),
            contents: bytemuck::cast_slice(&CUBE_COLORS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniform_slots = monitors.max(1);
        let uniform_stride = uniform_stride(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("desktop-cube-mvp"),
            size: uniform_stride * uniform_slots as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_size = NonZeroU64::new(std::mem::size_of::<CubeUniform>() as u64)
            .ok_or_else(|| RenderError::ResourceCreation("empty uniform".to_string()))?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("desktop-cube-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(uniform_size),
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("desktop-cube-bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: Some(uniform_size),
                }),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("desktop-cube-shader"),
            source: wgpu::ShaderSource::Wgsl(CUBE_SHADER_WGSL.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("desktop-cube-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("desktop-cube-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &POSITION_ATTRIBUTES,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &COLOR_ATTRIBUTES,
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: samples,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            cache: None,
        });

        let size = wgpu::Extent3d {
            width: gpu.config.width,
            height: gpu.config.height,
            depth_or_array_layers: 1,
        };
        let msaa_view = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("desktop-cube-msaa-color"),
                size,
                mip_level_count: 1,
                sample_count: samples,
                dimension: wgpu::TextureDimension::D2,
                format: gpu.config.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("desktop-cube-depth"),
                size,
                mip_level_count: 1,
                sample_count: samples,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());

        let [r, g, b, a] = config.clear_color;
        log::debug!(
            "uploaded cube geometry: {} vertices, {} indices, {uniform_slots} uniform slot(s) x {uniform_stride} bytes",
            CUBE_VERTICES.len(),
            CUBE_INDEX_COUNT
        );

        Ok(Self {
            vertex_buffer,
            color_buffer,
            index_buffer,
            uniform_buffer,
            bind_group,
            pipeline,
            msaa_view,
            depth_view,
            uniform_stride,
            uniform_slots,
            clear_color: wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: f64::from(a),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type ReleaseLog = Rc<RefCell<Vec<&'static str>>>;

    struct Held {
        label: &'static str,
        log: ReleaseLog,
    }

    impl Drop for Held {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.label);
        }
    }

    /// Acquires stand-ins as sequential locals in the same order as `bootstrap`,
    /// refusing the step at index `fail_at`.
    fn acquire_until(log: &ReleaseLog, fail_at: usize) -> std::result::Result<(), String> {
        let step = |index: usize, label: &'static str| {
            if index == fail_at {
                Err(format!("{label} refused"))
            } else {
                Ok(Held {
                    label,
                    log: Rc::clone(log),
                })
            }
        };
        let _display = step(0, "display")?;
        let _colormap = step(1, "colormap")?;
        let _window = step(2, "window")?;
        let _context = step(3, "context")?;
        Ok(())
    }

    #[test]
    fn failure_after_connecting_releases_only_the_display() {
        let log = ReleaseLog::default();
        assert_eq!(acquire_until(&log, 1), Err("colormap refused".to_string()));
        assert_eq!(*log.borrow(), vec!["display"]);
    }

    #[test]
    fn failure_before_connecting_releases_nothing() {
        let log = ReleaseLog::default();
        assert!(acquire_until(&log, 0).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn failure_at_context_releases_in_reverse_acquisition_order() {
        let log = ReleaseLog::default();
        assert_eq!(acquire_until(&log, 3), Err("context refused".to_string()));
        assert_eq!(*log.borrow(), vec!["window", "colormap", "display"]);
    }

    #[test]
    fn uniform_stride_rounds_up_to_alignment() {
        assert_eq!(uniform_stride(256), 256);
        assert_eq!(uniform_stride(64), 64);
        assert_eq!(uniform_stride(32), 64);
        assert_eq!(uniform_stride(0), 64);
    }

    #[test]
    fn linear_surface_format_is_preferred() {
        use wgpu::TextureFormat::*;
        assert_eq!(
            pick_surface_format(&[Bgra8UnormSrgb, Bgra8Unorm]),
            Some(Bgra8Unorm)
        );
        assert_eq!(
            pick_surface_format(&[Rgba16Float, Rgba8UnormSrgb]),
            Some(Rgba8UnormSrgb)
        );
        assert_eq!(pick_surface_format(&[Rgba16Float]), None);
    }
}
