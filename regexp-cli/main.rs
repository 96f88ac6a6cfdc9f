use std::{env, io::Write};

use regexp_lite::Regexp;

mod args;
mod logger;

const USAGE: &str = "\
A command line tool for compiling and running regexp-lite patterns.

USAGE:
    regexp <command> ...

COMMANDS:
    compile  Print the instruction program compiled from a pattern.
    match    Run a pattern against a string and print every capture group.
    sub      Replace the first match in a string using a template.
";

fn main() -> anyhow::Result<()> {
    let rustlog = env::var("RUST_LOG").unwrap_or_else(|_| String::new());
    let level = match &*rustlog {
        "" | "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        unk => anyhow::bail!("unrecognized log level '{}'", unk),
    };
    logger::Logger::init()?;
    log::set_max_level(level);

    if let Err(err) = run(&mut lexopt::Parser::from_env()) {
        writeln!(&mut std::io::stderr(), "{:#}", err).unwrap();
        std::process::exit(1);
    }
    Ok(())
}

fn run(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    let cmd = args::next_as_command(USAGE, p)?;
    match &*cmd {
        "compile" => run_compile(p),
        "match" => run_match(p),
        "sub" => run_sub(p),
        unk => anyhow::bail!("unrecognized command '{}'", unk),
    }
}

fn run_compile(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &str = "\
Prints the symbolic form of the instruction program compiled from a
pattern, one instruction per line, followed by the scan facts recorded
for the matcher.

USAGE:
    regexp compile <pattern>
";
    let pattern = args::next_as_value(USAGE, p)?;
    args::end(USAGE, p)?;

    let re = Regexp::new(&pattern)?;
    print!("{}", re.program());
    println!("anchored: {}", re.is_anchored());
    match re.start_char() {
        Some(c) => println!("start:    '{}'", c),
        None => println!("start:    none"),
    }
    println!("groups:   {}", re.group_count());
    Ok(())
}

fn run_match(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &str = "\
Matches a pattern against a string. Prints whether it matched and, for
every capture group starting with group 0 (the whole match), the captured
text or '<absent>'.

USAGE:
    regexp match <pattern> <string>
";
    let pattern = args::next_as_value(USAGE, p)?;
    let subject = args::next_as_value(USAGE, p)?;
    args::end(USAGE, p)?;

    let re = Regexp::new(&pattern)?;
    let mut groups: Vec<Option<String>> = vec![None; re.group_count()];
    let matched = re.match_substrings(&subject, &mut groups);
    println!("match: {}", matched);
    for (i, group) in groups.iter().enumerate() {
        match group {
            Some(text) => println!("{}: {}", i, text),
            None => println!("{}: <absent>", i),
        }
    }
    Ok(())
}

fn run_sub(p: &mut lexopt::Parser) -> anyhow::Result<()> {
    const USAGE: &str = "\
Replaces the first match of a pattern in a string with the rendering of a
substitution template and prints the result. Prints nothing when there is
no match. In the template, '&' is the whole match and '\\N' is capture
group N.

USAGE:
    regexp sub <pattern> <string> <template>
";
    let pattern = args::next_as_value(USAGE, p)?;
    let subject = args::next_as_value(USAGE, p)?;
    let template = args::next_as_value(USAGE, p)?;
    args::end(USAGE, p)?;

    let re = Regexp::new(&pattern)?;
    if let Some(result) = re.replace_first(&subject, &template) {
        println!("{}", result);
    }
    Ok(())
}
