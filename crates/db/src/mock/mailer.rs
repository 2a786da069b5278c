use async_trait::async_trait;
use mockall::mock;
use officehours_core::notify::{Mailer, Notification};

// Mock mail transport for testing the notification worker
mock! {
    pub Mailer {}

    #[async_trait]
    impl Mailer for Mailer {
        async fn send(&self, notification: Notification) -> eyre::Result<()>;
    }
}
