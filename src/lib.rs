//! Nyangseng is a "which cat were you in a past life" personality quiz.
//!
//! The crate is split into three pure components plus the shell glue around them:
//!
//! - [`QuizEngine`] walks a [`Session`] through the questions of a [`Catalog`]
//! - [`resolve`] matches the accumulated tag profile against the catalog results
//! - [`Compositor`] renders a result into a shareable PNG card
//!
//! [`QuizShell`] owns the active session and applies the anti-resume policy on navigation and
//! reload events.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod catalog;
mod compose;
mod foundation;
mod matching;
mod quiz;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{AssetRole, NyangError, NyangResult};

pub use crate::catalog::model::{
    Catalog, CatalogSettings, FALLBACK_RESULT_ID, GalleryCard, Question, QuizOption, QuizResult,
    result_ordinal,
};
pub use crate::matching::matcher::{
    DEFAULT_MATCH_THRESHOLD, MatchPolicy, RankedResult, ScoreMode, rank, resolve,
    resolve_session, score,
};
pub use crate::quiz::engine::{Affordance, QuestionView, QuizEngine, Session, Step};
pub use crate::quiz::lifecycle::{
    MemoryFlags, QuizShell, RELOAD_FLAG_KEY, ReloadGuard, ShellAction, ShellEvent, TransientFlags,
};

pub use crate::compose::assets::{
    AssetLoader, DecodedImage, DirAssetLoader, MemoryAssetLoader, load_logo, load_source,
    normalize_rel_path,
};
pub use crate::compose::export::{
    DirDownloadSink, DownloadSink, ExportedImage, NoShare, SHARE_UNSUPPORTED_MESSAGE,
    ShareOutcome, ShareTarget, download, encode_png, export_file_name, share_or_explain,
};
pub use crate::compose::layout::{
    CardLayout, LayoutParams, PlacedText, TextAnchor, compute_layout, fit_within,
    rounded_rect_path,
};
pub use crate::compose::raster::{Branding, Compositor};
pub use crate::compose::text::{
    MonospaceTypesetter, ParleyTypesetter, TextMeasure, Typesetter, wrap_words,
};
