use owo_colors::OwoColorize;
use std::error::Error;
use wavdeck::config::Config;
use wavdeck::host::eeprom::FileEeprom;
use wavdeck::host::lights::hex;
use wavdeck::player::colors::ColorConfig;

pub fn handle_colors() -> Result<(), Box<dyn Error>> {
    let path = Config::eeprom_path()?;
    let store = FileEeprom::open(&path)?;
    let colors = ColorConfig::load(&store)?;

    println!("Indicator colours ({}):", path.display());
    for (index, led) in colors.leds.iter().enumerate() {
        println!(
            "  LED {index}  {}  {}",
            "██████".truecolor(led.r, led.g, led.b),
            hex((led.r, led.g, led.b)).bright_black()
        );
    }
    if !path.exists() {
        println!(
            "{}",
            "Nothing stored yet; submit the form served by 'wavdeck play'.".bright_black()
        );
    }

    Ok(())
}
