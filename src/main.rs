mod image;
mod listing;

use std::borrow::Cow;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use commands::{Config, Target, ARGS};
use image::Image;
use listing::Location;
use symbols::msvc::Options;

#[derive(Debug, PartialEq, Eq)]
enum Outcome<'a> {
    Transcoded(String),
    Kept(&'a str),
    Dropped,
}

impl<'a> Outcome<'a> {
    fn name(&self) -> Option<Cow<'a, str>> {
        match self {
            Outcome::Transcoded(name) => Some(Cow::Owned(name.clone())),
            Outcome::Kept(name) => Some(Cow::Borrowed(*name)),
            Outcome::Dropped => None,
        }
    }
}

#[derive(Default, Debug)]
struct Stats {
    transcoded: usize,
    kept: usize,
    dropped: usize,
    unresolved: usize,
}

/// Decide what a raw listing name turns into.
fn rename<'a>(raw: &'a str, config: &Config, opts: &Options) -> Outcome<'a> {
    let transcoded = symbols::parse(raw.as_bytes())
        .and_then(|symbol| symbols::msvc::emit_with(&symbol, opts));

    match transcoded {
        Ok(name) => Outcome::Transcoded(name),
        Err(symbols::Error::NotMangled) if config.skip_unmangled => Outcome::Dropped,
        Err(symbols::Error::NotMangled) => Outcome::Kept(raw),
        Err(err) => {
            log::trace!("[main::rename] failed to transcode '{raw}': {err}.");
            if config.passthrough {
                Outcome::Kept(raw)
            } else {
                Outcome::Dropped
            }
        }
    }
}

fn resolve(location: Location, image: Option<&Image>) -> Option<(u16, u32)> {
    match location {
        Location::Section { index, offset } => Some((index, offset)),
        Location::Virtual(addr) => image?.resolve(addr),
    }
}

fn read_listing(path: &Path) -> std::io::Result<String> {
    if path == Path::new("-") {
        let mut src = String::new();
        std::io::stdin().read_to_string(&mut src)?;
        return Ok(src);
    }

    std::fs::read_to_string(path)
}

/// The `--target` flag wins, then the image's bitness, then the config.
fn target(cli: Option<Target>, image: Option<&Image>, config: &Config) -> Target {
    cli.or_else(|| image.map(|image| if image.is_64() { Target::X64 } else { Target::X86 }))
        .unwrap_or(config.target)
}

fn main() {
    log::set_verbose(ARGS.debug);

    let config = Config::parse(ARGS.config.as_deref());
    let image = ARGS.image.as_ref().map(|path| {
        Image::open(path).unwrap_or_else(|err| log::error!("Failed to open {path:?}: {err}"))
    });

    let opts = target(ARGS.target, image.as_ref(), &config).options();
    log::trace!("[main] emitting names with {opts:?}.");

    let src = read_listing(&ARGS.listing)
        .unwrap_or_else(|err| log::error!("Failed to read {:?}: {err}.", ARGS.listing));

    let mut out: Box<dyn Write> = match ARGS.output {
        Some(ref path) => match std::fs::File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(err) => log::error!("Failed to create {path:?}: {err}."),
        },
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let entries = listing::parse(&src);
    let mut stats = Stats::default();
    log::PROGRESS.set("Transcoding symbols", entries.len());

    for entry in entries {
        log::PROGRESS.step();

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warning!("{err}");
                continue;
            }
        };

        let (index, offset) = match resolve(entry.location, image.as_ref()) {
            Some(resolved) => resolved,
            None => {
                log::warning!("Failed to resolve the address of '{}'.", entry.name);
                stats.unresolved += 1;
                continue;
            }
        };

        let outcome = rename(entry.name, &config, &opts);
        match outcome {
            Outcome::Transcoded(..) => stats.transcoded += 1,
            Outcome::Kept(..) => stats.kept += 1,
            Outcome::Dropped => stats.dropped += 1,
        }

        if let Some(name) = outcome.name() {
            if let Err(err) = writeln!(out, "{}", listing::format(index, offset, &name)) {
                log::error!("Failed to write output: {err}.");
            }
        }
    }

    if let Err(err) = out.flush() {
        log::error!("Failed to write output: {err}.");
    }

    log::notify!("{}", log::PROGRESS.summary());
    log::notify!(
        "{} transcoded, {} kept, {} dropped, {} unresolved.",
        stats.transcoded,
        stats.kept,
        stats.dropped,
        stats.unresolved
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x86() -> Options {
        Target::X86.options()
    }

    #[test]
    fn renaming() {
        let config = Config::default();

        assert_eq!(
            rename("_Z3addii", &config, &x86()),
            Outcome::Transcoded("?add@@YAXHH@Z".to_string())
        );
        assert_eq!(rename("main", &config, &x86()), Outcome::Kept("main"));
        assert_eq!(rename("_Z3fooIi", &config, &x86()), Outcome::Kept("_Z3fooIi"));
    }

    #[test]
    fn renaming_without_passthrough() {
        let config = Config {
            passthrough: false,
            skip_unmangled: true,
            ..Config::default()
        };

        assert_eq!(rename("main", &config, &x86()), Outcome::Dropped);
        assert_eq!(rename("_ZTV3Foo", &config, &x86()), Outcome::Dropped);
        assert_eq!(
            rename("_ZNK3Foo3getEv", &config, &Target::X64.options()),
            Outcome::Transcoded("?get@Foo@@QEBAXXZ".to_string())
        );
    }

    #[test]
    fn resolving_without_image() {
        assert_eq!(resolve(Location::Section { index: 1, offset: 4 }, None), Some((1, 4)));
        assert_eq!(resolve(Location::Virtual(0x401000), None), None);
    }

    #[test]
    fn target_precedence() {
        let config = Config {
            target: Target::X64,
            ..Config::default()
        };

        assert_eq!(target(Some(Target::X86), None, &config), Target::X86);
        assert_eq!(target(None, None, &config), Target::X64);
        assert_eq!(target(None, None, &Config::default()), Target::X86);
    }
}
