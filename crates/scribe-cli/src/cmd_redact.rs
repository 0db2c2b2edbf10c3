use std::io::{Read, Write};

use scribe_redact::redact;

pub fn execute() -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let redaction = redact(&input);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(redaction.text.as_bytes())?;
    stdout.flush()?;
    eprintln!("{}", serde_json::to_string(&redaction.stats)?);
    Ok(())
}
