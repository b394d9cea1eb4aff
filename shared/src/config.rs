use anyhow::Result;

pub struct AppConfig {
    pub database: DatabaseConfig,
    pub booking: BookingConfig,
}

impl AppConfig {
    pub fn new() -> Result<Self> {
        let database = DatabaseConfig {
            host: std::env::var("DATABASE_HOST")?,
            port: std::env::var("DATABASE_PORT")?.parse()?,
            username: std::env::var("DATABASE_USERNAME")?,
            password: std::env::var("DATABASE_PASSWORD")?,
            database: std::env::var("DATABASE_NAME")?,
        };
        let booking = BookingConfig {
            // 予約を申請と同時に confirmed にするか、管理者承認待ち（pending）で
            // 受け付けるかの切り替え。未設定時は自動確定
            auto_confirm: std::env::var("BOOKING_AUTO_CONFIRM")
                .map(|v| v != "false")
                .unwrap_or(true),
        };
        Ok(Self { database, booking })
    }
}

pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

pub struct BookingConfig {
    pub auto_confirm: bool,
}
