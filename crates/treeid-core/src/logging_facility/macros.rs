//! Canonical logging macros

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use treeid_core::log_op_start;
/// log_op_start!("reconcile");
/// log_op_start!("reconcile", pass_id = "p1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use treeid_core::log_op_end;
/// log_op_end!("reconcile", duration_ms = 3);
/// log_op_end!("reconcile", duration_ms = 3, created = 2);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// `err` is anything convertible into [`ExError`](crate::errors::ExError).
/// The operation name is attached to the error, and its pass id, when set,
/// is logged as `pass_id`.
///
/// # Example
///
/// ```
/// # use treeid_core::{log_op_error, errors::ResolveError};
/// let err = ResolveError::DepthExceeded { max_depth: 8 };
/// log_op_error!("reconcile", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err = $crate::errors::ExError::from($err).with_op($op);
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            pass_id = ex_err.pass_id().map(|id| id.as_str()),
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            "{}",
            ex_err
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err = $crate::errors::ExError::from($err).with_op($op);
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            pass_id = ex_err.pass_id().map(|id| id.as_str()),
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($field)*,
            "{}",
            ex_err
        );
    }};
}
