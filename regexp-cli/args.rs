use lexopt::{Arg, Parser, ValueExt};

/// Parses the next entry as a sub-command name. When there is none, or
/// when -h/--help is given, the usage text is turned into an error.
pub fn next_as_command(usage: &str, p: &mut Parser) -> anyhow::Result<String> {
    let usage = usage.trim();
    let arg = match p.next()? {
        Some(arg) => arg,
        None => anyhow::bail!("{}", usage),
    };
    match arg {
        Arg::Value(cmd) => Ok(cmd.string()?),
        Arg::Short('h') | Arg::Long("help") => anyhow::bail!("{}", usage),
        arg => Err(arg.unexpected().into()),
    }
}

/// Parses the next entry as a positional value, erroring with the usage
/// text when it is missing. Taking it as a raw value lets patterns and
/// templates start with a dash.
pub fn next_as_value(usage: &str, p: &mut Parser) -> anyhow::Result<String> {
    match p.value() {
        Ok(value) => Ok(value.string()?),
        Err(lexopt::Error::MissingValue { .. }) => anyhow::bail!("{}", usage.trim()),
        Err(err) => Err(err.into()),
    }
}

/// Errors with the usage text when any argument is left over.
pub fn end(usage: &str, p: &mut Parser) -> anyhow::Result<()> {
    match p.next()? {
        None => Ok(()),
        Some(_) => anyhow::bail!("{}", usage.trim()),
    }
}
