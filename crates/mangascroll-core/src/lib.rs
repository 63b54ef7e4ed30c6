//! Auto-scroll engine for reading long vertical pages.
//!
//! The engine advances a scroll container frame by frame, decides when the end
//! of the content has been reached even when the page hides its real height,
//! and tracks whether the embedded page is ready to be scrolled.

pub mod config;
pub mod container;
pub mod detector;
pub mod driver;
pub mod events;
pub mod lifecycle;
pub mod navigation;
pub mod protocol;
pub mod reader;
pub mod scheduler;
pub mod session;
pub mod shortcuts;
pub mod speed;

pub use config::EngineConfig;
pub use container::{ScrollContainer, ScrollMetrics, SimulatedContainer};
pub use detector::{DetectorConfig, Detection, DimensionPath, EndDetector, StopReason};
pub use driver::{ScrollDriver, StartOutcome, StartRejection, TickOutcome};
pub use events::{BoundaryEvent, LoadOutcome, LoadStateEvent, Notice, NoticeVariant};
pub use lifecycle::{ContentFrame, LifecycleConfig, LoadPhase};
pub use navigation::{ChapterNavigator, NavigationError};
pub use protocol::{ChapterInfo, MangaApiRequest, MangaApiResponse, proxy_path};
pub use reader::{ReaderCommand, ReaderEvent, ReaderSession, ReaderSnapshot};
pub use scheduler::{FrameHandle, FrameScheduler, ManualFrameScheduler};
pub use session::{ScrollDirection, ScrollSession};
pub use shortcuts::{KeyModifiers, Keymap, ShortcutAction};
pub use speed::{SpeedCurve, SpeedLevel};

use std::fs;
use std::path::Path;
use ts_rs::TS;

fn export_single_type<T: TS + 'static>(out_dir: &Path) -> Result<(), String> {
    T::export_all_to(out_dir).map_err(|err| err.to_string())
}

/// Regenerate the TypeScript declarations for every wire type in `out_dir`.
pub fn export_ts_bindings(out_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(out_dir)
        .map_err(|err| format!("Failed to create {}: {err}", out_dir.display()))?;

    for entry in fs::read_dir(out_dir)
        .map_err(|err| format!("Failed to list {}: {err}", out_dir.display()))?
    {
        let entry = entry.map_err(|err| format!("Failed to read entry: {err}"))?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("ts") {
            fs::remove_file(&path)
                .map_err(|err| format!("Failed to remove {}: {err}", path.display()))?;
        }
    }

    export_single_type::<SpeedLevel>(out_dir)?;
    export_single_type::<ScrollDirection>(out_dir)?;
    export_single_type::<StopReason>(out_dir)?;
    export_single_type::<NoticeVariant>(out_dir)?;
    export_single_type::<Notice>(out_dir)?;
    export_single_type::<BoundaryEvent>(out_dir)?;
    export_single_type::<LoadOutcome>(out_dir)?;
    export_single_type::<LoadStateEvent>(out_dir)?;
    export_single_type::<LoadPhase>(out_dir)?;
    export_single_type::<KeyModifiers>(out_dir)?;
    export_single_type::<MangaApiRequest>(out_dir)?;
    export_single_type::<ChapterInfo>(out_dir)?;
    export_single_type::<MangaApiResponse>(out_dir)?;
    export_single_type::<ReaderSnapshot>(out_dir)?;

    let index_content = r#"export type { SpeedLevel } from "./SpeedLevel";
export type { ScrollDirection } from "./ScrollDirection";
export type { StopReason } from "./StopReason";
export type { NoticeVariant } from "./NoticeVariant";
export type { Notice } from "./Notice";
export type { BoundaryEvent } from "./BoundaryEvent";
export type { LoadOutcome } from "./LoadOutcome";
export type { LoadStateEvent } from "./LoadStateEvent";
export type { LoadPhase } from "./LoadPhase";
export type { KeyModifiers } from "./KeyModifiers";
export type { MangaApiRequest } from "./MangaApiRequest";
export type { ChapterInfo } from "./ChapterInfo";
export type { MangaApiResponse } from "./MangaApiResponse";
export type { ReaderSnapshot } from "./ReaderSnapshot";
"#;

    fs::write(out_dir.join("index.ts"), index_content).map_err(|err| {
        format!(
            "Failed to write {}: {err}",
            out_dir.join("index.ts").display()
        )
    })?;

    Ok(())
}
