mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use iced::window;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paper_summarizer=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    init_logging();
    tracing::info!("Starting Paper Summarizer");

    iced::application(app::SummarizerApp::default, app::update, app::view)
        .title("Paper Summarizer")
        .subscription(app::subscription)
        .window(window::Settings {
            size: iced::Size::new(560.0, 680.0),
            ..Default::default()
        })
        .run()
}
