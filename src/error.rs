use thiserror::Error;

#[derive(Error, Debug)]
pub enum MffError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Ошибка оконного менеджера: {0}")]
    Host(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),
}

pub type Result<T> = std::result::Result<T, MffError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! mff_error {
    (host, $($arg:tt)*) => {
        $crate::error::MffError::Host(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::MffError::ServiceUnavailable(format!($($arg)*))
    };
}
