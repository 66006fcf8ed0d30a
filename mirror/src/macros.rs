//! Macros for sync error handling.
//!
//! Convenience macros for creating and returning [`crate::error::MirrorError`]
//! instances with reduced boilerplate.

/// Creates a [`crate::error::MirrorError`] from an error kind and description.
///
/// Accepts an optional dynamic detail and an optional source error:
///
/// ```ignore
/// mirror_error!(ErrorKind::DestinationError, "Rename failed");
/// mirror_error!(ErrorKind::DestinationError, "Rename failed", detail);
/// mirror_error!(ErrorKind::DestinationError, "Rename failed", detail, source: err);
/// ```
#[macro_export]
macro_rules! mirror_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::MirrorError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::MirrorError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::MirrorError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::MirrorError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns a [`crate::error::MirrorError`] from the current
/// function. Supports the same arguments as [`mirror_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::mirror_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::mirror_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::mirror_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::mirror_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
