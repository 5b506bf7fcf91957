//! # 错误处理宏

/// 快速创建验证错误的宏
#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::AppError::validation($msg, None)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AppError::validation(format!($fmt, $($arg)*), None)
    };
}

/// 确保条件成立，否则返回验证错误
#[macro_export]
macro_rules! ensure_valid {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::validation_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::validation_error!($fmt, $($arg)*));
        }
    };
}
