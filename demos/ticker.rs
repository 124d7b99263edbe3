//! Plays a short queue of banners across a virtual 80x5 region and prints each frame.
//!
//! Run with `REGION_OVERLAY_DEBUG=1` to see the lifecycle events on stderr.

use std::time::Duration;

use region_overlay::logging;
use region_overlay::{
    AnimationStep, AxisOrth, DirectoryOptions, EnvConfig, LineOut, OverlayError, PresentMode,
    QueueOptions, RegionDirectory, Scheduler, SurfaceAttachment, SurfaceSize, ViewRegistry,
};

const REGION: &str = "ticker";
const SIZE: SurfaceSize = SurfaceSize::new(80.0, 5.0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), OverlayError> {
    let config = EnvConfig::from_env();
    logging::init(&config)?;

    let directory =
        RegionDirectory::with_scheduler(Scheduler::current()?, DirectoryOptions::from(&config));
    let mut contents = ViewRegistry::new();
    let mut surface = SurfaceAttachment::attach(&directory, REGION);

    let options = QueueOptions {
        on_screen: Some(Duration::from_millis(1500)),
        ..QueueOptions::from(&config)
    };
    let queue = directory.queue(REGION, options.with_axis(AxisOrth::horizontal(2.0)));

    let badge = contents.register("[LIVE]");
    directory.get_or_create(REGION).present(
        badge,
        "badge",
        PresentMode::Replace,
        &[AnimationStep::at((74.0, 0.0).into())],
    );

    for headline in ["build green", "deploy started", "deploy finished"] {
        queue
            .push_view(contents.register(headline), Some(-20.0), None, None)
            .enter(Some(SIZE.width / 2.0), None, None)
            .leave(Some(SIZE.width + 20.0), None, None);
    }
    queue.line_out(contents.register("breaking"), LineOut::new(SIZE.width).reversed());
    queue.show();

    let deadline = tokio::time::sleep(Duration::from_secs(8));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            snapshot = surface.changed() => {
                println!("-- revision {}", snapshot.revision());
                for slot in surface.frame(SIZE) {
                    let label = contents.get(slot.view).copied().unwrap_or("?");
                    println!(
                        "  z={} {:<16} at ({:>6.1}, {:>4.1}) opacity {:.2}",
                        slot.z, label, slot.position.x, slot.position.y, slot.opacity
                    );
                }
            }
        }
        if !queue.is_active() && queue.pending_len() == 0 {
            break;
        }
    }

    directory.get_or_create(REGION).dismiss_all();
    Ok(())
}
