use super::{json_pretty, layout, Session, EXIT_SUCCESS};

pub fn run(session: &Session<'_>, json: bool) -> Result<u8, String> {
    let engine = session.engine(layout(None, None))?;
    let values = engine.configure().map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&values)?);
    } else {
        let width = values.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in values.iter() {
            println!("{key:<width$} = {value}");
        }
    }
    Ok(EXIT_SUCCESS)
}
