mod app;
mod assets;
mod camera;
mod config;
mod input;
mod model;
mod render;
mod scene;
mod sim;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
