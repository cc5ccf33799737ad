mod metadata;
mod run;
mod settings;

use clap::Parser;
use settings::Settings;

fn main() -> Result<(), waypoint_icon_lib::IconError> {
    let settings = Settings::parse();
    run::native_main(settings, run::logging_dispatch())
}
