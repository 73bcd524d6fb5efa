//! Demo shell: a window cleared through the frame graph every frame.
//!
//! Drives the whole engine end-to-end: context creation, per-frame graph
//! declaration, pacing, and swapchain recovery on resize.

use std::time::Instant;

use log::info;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use kiln::{Attachment, Context, FramePacer, Settings};

fn main() {
    pretty_env_logger::init();

    let settings = Settings::load().expect("failed to load settings");
    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("kiln")
        .with_inner_size(LogicalSize::new(1280.0, 720.0))
        .build(&event_loop)
        .expect("failed to create window");

    let size = window.inner_size();
    let context = Context::new(&window, size.width, size.height, settings.context.clone());
    let mut pacer = Some(FramePacer::new(context, &settings.pacer));
    let started = Instant::now();

    info!("entering main loop");
    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => *control_flow = ControlFlow::Exit,
            Event::WindowEvent {
                event: WindowEvent::Resized(new_size),
                ..
            } => {
                if new_size.width > 0 && new_size.height > 0 {
                    if let Some(pacer) = pacer.as_mut() {
                        pacer.on_resize(new_size.width, new_size.height);
                    }
                }
            }
            Event::MainEventsCleared => window.request_redraw(),
            Event::RedrawRequested(_) => {
                if let Some(pacer) = pacer.as_mut() {
                    draw(pacer, &window, started);
                }
            }
            Event::LoopDestroyed => {
                // dropping the pacer idles the device and tears everything down
                pacer.take();
            }
            _ => {}
        }
    });
}

fn draw(pacer: &mut FramePacer<Context>, window: &Window, started: Instant) {
    let size = window.inner_size();
    if size.width == 0 || size.height == 0 {
        return;
    }

    let Some(mut frame) = pacer.begin() else {
        pacer.on_resize(size.width, size.height);
        return;
    };

    let t = started.elapsed().as_secs_f32();
    let clear = [
        0.5 + 0.5 * (t * 0.7).sin(),
        0.5 + 0.5 * (t * 0.9 + 2.0).sin(),
        0.5 + 0.5 * (t * 1.1 + 4.0).sin(),
        1.0,
    ];
    frame
        .builder
        .add_render_pass("clear")
        .set_color_attachment(Attachment::clear_color(frame.swapchain_image, clear))
        .execute(|_cmd| {
            // the clear happens through the attachment load op; nothing to
            // record
        });

    let graph = frame.builder.build().expect("frame graph build failed");
    if !pacer.end(graph) {
        pacer.on_resize(size.width, size.height);
    }
}
