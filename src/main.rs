// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

use pixelroom::canvas::Direction;
use pixelroom::canvas::PixelColor;
use pixelroom::canvas::Tool;
use pixelroom::config::Config;
use pixelroom::logging::LoggingConfig;
use pixelroom::logging::init_logging;
use pixelroom::room::Hub;

fn render(hub: &Hub) {
    let Some(session) = hub.sessions().first() else {
        return;
    };
    for formatted in session.layers() {
        println!("layer {} ({:?}):", formatted.layer.id, formatted.layer.blend_mode);
        for row in formatted.grid.rows() {
            let line: String = row
                .iter()
                .map(|cell| match cell {
                    None | Some(PixelColor::Transparent) => '.',
                    Some(_) => '#',
                })
                .collect();
            println!("  {}", line);
        }
    }
}

fn main() -> Result<(), pixelroom::Error> {
    init_logging(LoggingConfig::default());

    let mut hub = Hub::new("demo", Config::from_env());
    let ada = hub.join("ada");
    let bob = hub.join("bob");
    let ink: PixelColor = "#202020".parse()?;

    if let Some(session) = hub.get_mut(&ada) {
        session.create_canvas("demo", 6, 4)?;
        session.begin_stroke();
        for col in 0..6 {
            session.apply_pixel_edit(1, col, ink);
        }
        session.end_stroke();
    }
    hub.flush();

    if let Some(session) = hub.get_mut(&bob) {
        session.set_tool(Tool::Fill);
        session.apply_pixel_edit(3, 0, ink);
        session.move_layer(Direction::Up);
    }
    hub.flush();
    render(&hub);

    if let Some(session) = hub.get_mut(&ada) {
        session.undo();
    }
    hub.flush();
    println!("after ada's undo:");
    render(&hub);

    println!("{} peers seen by ada", hub.get(&ada).map(|s| s.peers().len()).unwrap_or(0));
    return Ok(());
}
