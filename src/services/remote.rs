use crate::config::RemoteConfig;
use crate::error::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};
use zbus::{connection, fdo, interface, Connection};

/// Команда, пришедшая по D-Bus. Исполняется в цикле событий через хост.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCommand {
    FocusWorkspace(u32),
    HideOverview,
    ClearNotifications,
}

pub struct RemoteInterface {
    tx: mpsc::Sender<RemoteCommand>,
}

impl RemoteInterface {
    pub fn new(tx: mpsc::Sender<RemoteCommand>) -> Self {
        Self { tx }
    }

    async fn forward(&self, command: RemoteCommand) -> fdo::Result<()> {
        debug!("Удалённая команда: {:?}", command);
        self.tx
            .send(command)
            .await
            .map_err(|_| fdo::Error::Failed("Цикл событий остановлен".to_string()))
    }
}

#[interface(name = "io.github.MouseFollowsFocus")]
impl RemoteInterface {
    async fn focus_workspace(&self, index: u32) -> fdo::Result<()> {
        self.forward(RemoteCommand::FocusWorkspace(index)).await
    }

    async fn hide_overview(&self) -> fdo::Result<()> {
        self.forward(RemoteCommand::HideOverview).await
    }

    async fn clear_notifications(&self) -> fdo::Result<()> {
        self.forward(RemoteCommand::ClearNotifications).await
    }
}

/// Регистрирует объект на сессионной шине. Соединение живёт, пока его держат.
pub async fn serve(config: &RemoteConfig, tx: mpsc::Sender<RemoteCommand>) -> Result<Connection> {
    info!(
        "Регистрация D-Bus интерфейса {} на {}",
        config.bus_name, config.object_path
    );

    let connection = connection::Builder::session()?
        .name(config.bus_name.as_str())?
        .serve_at(config.object_path.as_str(), RemoteInterface::new(tx))?
        .build()
        .await?;

    Ok(connection)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_commands_are_forwarded_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let iface = RemoteInterface::new(tx);

        iface.focus_workspace(2).await.unwrap();
        iface.hide_overview().await.unwrap();
        iface.clear_notifications().await.unwrap();

        assert_eq!(rx.recv().await, Some(RemoteCommand::FocusWorkspace(2)));
        assert_eq!(rx.recv().await, Some(RemoteCommand::HideOverview));
        assert_eq!(rx.recv().await, Some(RemoteCommand::ClearNotifications));
    }

    #[tokio::test]
    async fn test_closed_loop_reports_failure() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let iface = RemoteInterface::new(tx);

        assert!(iface.hide_overview().await.is_err());
    }
}
