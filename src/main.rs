// What you SEE:
// • First the calibration square: hold the marker over it until the readout hits 100%.
// • One marker draws; close the loop and the stroke becomes a shape.
// • Two markers held on a shape erase it; three or more drag the nearest shape.
// • C clears every shape, R recalibrates, ESC quits.

use std::time::{Duration, Instant};

use clap::Parser;
use log::info;

use gesture_draw::camera::{CameraCapture, FrameSource, ImageSequence};
use gesture_draw::cli::Cli;
use gesture_draw::clock::{FrameClock, PlaybackClock, WallClock};
use gesture_draw::draw::{draw_text_5x7, Drawer};
use gesture_draw::{Error, Session};

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let config = cli.engine_config();

    /* --- Frame source + clock ---
       Recorded frames advance by a nominal frame time, the camera by wall time. */
    let (mut source, mut clock): (Box<dyn FrameSource>, Box<dyn FrameClock>) = match &cli.frames {
        Some(dir) => (
            Box::new(ImageSequence::open(dir)?),
            Box::new(PlaybackClock::from_rate(cli.rate, config.gesture_dt_scale)),
        ),
        None => (
            Box::new(CameraCapture::new(cli.camera, cli.width, cli.height)?),
            Box::new(WallClock::new()),
        ),
    };
    let (w, h) = source.resolution();
    let mut drawer = Drawer::new(&config.window_name, w as usize, h as usize)?;

    let mut session = Session::new(config.clone());
    info!("session started ({}x{}, from file: {})", w, h, cli.from_file());

    /* --- HUD / FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        let Some(frame) = source.next_frame()? else {
            info!("end of recorded frames");
            break;
        };

        if drawer.c_pressed_once() {
            session.clear_shapes();
        }
        if drawer.r_pressed_once() {
            info!("recalibrating");
            session = Session::new(config.clone());
        }

        let mut screen = session.process_frame(&frame, clock.as_mut())?;
        let hud_y = screen.height as i32 - 14;
        draw_text_5x7(&mut screen, 8, hud_y, &hud_fps_text, 0x00FFFFFF);
        drawer.present(&screen)?;

        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            hud_fps_text = format!("FPS: {:.1}", frames_this_second as f32 / secs);
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    Ok(())
}
