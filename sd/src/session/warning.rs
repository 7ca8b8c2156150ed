//! User-visible warnings and action outcomes

use thiserror::Error;

/// Recovered failures surfaced to the user
///
/// None of these end the session; each one is reported and the action that
/// raised it leaves the session in a retryable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("複数のパターンが指定されています。1つだけ指定してください")]
    AmbiguousPattern,

    #[error("翻訳に失敗しました。")]
    TranslationFailed,

    #[error("画像生成に失敗しました")]
    GenerationFailed,

    #[error("先に画像を生成してください")]
    GenerateFirst,

    #[error("プレビュー画像の生成に失敗しました")]
    PreviewFailed,

    #[error("エクスポートに失敗しました")]
    ExportFailed,
}

/// Why an action was refused before any work started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("an image request is already in flight")]
    Busy,

    #[error("preview is only available right after a three-image generation")]
    PreviewUnavailable,

    #[error("the selected slot has no image yet")]
    EmptySlot,

    #[error("export is only available after a preview expansion")]
    ExportUnavailable,

    #[error("an export is already in flight")]
    ExportInFlight,
}

/// How a top-level action ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T = ()> {
    /// The action ran and its result was applied
    Completed(T),
    /// The action ran but a service failed; a warning was raised
    Failed(Warning),
    /// The action was refused and state was not touched
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
