use crate::Target;
use std::fmt;
use std::path::PathBuf;

macro_rules! exit {
    ($code:expr => $($arg:tt)*) => {{
        eprintln!($($arg)*);
        std::process::exit($code);
    }};
}

const HELP: &str = "OVERVIEW: Rewrites Itanium C++ symbol names as MSVC names

USAGE: symbridge [options] <LISTING>

OPTIONS:
  -H, --help          Print usage information
  -I, --image         Path to PE image used for resolving addresses
  -O, --output        Path to write the rewritten listing to
  -C, --config        Path to config used for transcoding
  -T, --target        Architecture to emit names for (x86 or x64)
  -B, --debug         Enable verbose internal info";

const ABBRV: &[&str] = &["-H", "-I", "-O", "-C", "-T", "-B"];
const NAMES: &[&str] = &[
    "--help",
    "--image",
    "--output",
    "--config",
    "--target",
    "--debug",
];

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    /// Path to the listing of addresses and symbol names.
    pub listing: PathBuf,

    /// Optional image the addresses are relative to.
    pub image: Option<PathBuf>,

    /// Where to write results, stdout if none is given.
    pub output: Option<PathBuf>,

    /// Optional path to config.
    pub config: Option<PathBuf>,

    /// Overrides the config's target.
    pub target: Option<Target>,

    /// Echo trace lines.
    pub debug: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Help,
    MissingValue(&'static str),
    AlreadyGiven(&'static str),
    UnknownTarget(String),
    Unknown { arg: String, guess: Option<&'static str> },
    MissingListing,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Help => f.write_str(HELP),
            Self::MissingValue(flag) => write!(f, "Missing value for '{flag}'."),
            Self::AlreadyGiven(what) => write!(f, "{what} already given."),
            Self::UnknownTarget(target) => {
                write!(f, "Unknown target '{target}', expected either x86 or x64.")
            }
            Self::Unknown { arg, guess: Some(guess) } => {
                write!(f, "Unknown cmd arg '{arg}' did you mean '{guess}'?")
            }
            Self::Unknown { arg, guess: None } => write!(f, "Unknown cmd arg '{arg}' was entered."),
            Self::MissingListing => f.write_str("You must provide a listing to transcode."),
        }
    }
}

/// Value following a flag, as long as it isn't another flag.
fn value<I: Iterator<Item = String>>(args: &mut I, flag: &'static str) -> Result<String, Error> {
    match args.next() {
        Some(value) if !NAMES.contains(&&*value) && !ABBRV.contains(&&*value) => Ok(value),
        _ => Err(Error::MissingValue(flag)),
    }
}

fn path<I: Iterator<Item = String>>(
    args: &mut I,
    flag: &'static str,
    slot: &mut Option<PathBuf>,
    what: &'static str,
) -> Result<(), Error> {
    let value = value(args, flag)?;
    if slot.is_some() {
        return Err(Error::AlreadyGiven(what));
    }
    *slot = Some(PathBuf::from(value));
    Ok(())
}

fn best_guess(unknown: &str) -> Option<&'static str> {
    let mut distance = u32::MAX;
    let mut best_guess = "";
    for name in NAMES {
        let d = triple_accel::levenshtein_exp(unknown.as_bytes(), name.as_bytes());
        if d < distance {
            distance = d;
            best_guess = name;
        }
    }

    // A guess that's less than 3 `steps` away from a correct arg.
    (distance < 4).then_some(best_guess)
}

impl Cli {
    pub fn parse() -> Self {
        match Self::parse_from(std::env::args().skip(1)) {
            Ok(cli) => {
                cli.validate_args();
                cli
            }
            Err(Error::Help) => exit!(0 => "{HELP}"),
            Err(err) => exit!(1 => "{err}"),
        }
    }

    pub fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Result<Self, Error> {
        let mut cli = Cli::default();
        let mut listing = None;
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-H" | "--help" => return Err(Error::Help),
                "-I" | "--image" => path(&mut args, "--image", &mut cli.image, "Path to image")?,
                "-O" | "--output" => {
                    path(&mut args, "--output", &mut cli.output, "Path to output")?
                }
                "-C" | "--config" => {
                    path(&mut args, "--config", &mut cli.config, "Path to config")?
                }
                "-T" | "--target" => {
                    let name = value(&mut args, "--target")?;
                    if cli.target.is_some() {
                        return Err(Error::AlreadyGiven("Target"));
                    }
                    match Target::from_name(&name) {
                        Some(target) => cli.target = Some(target),
                        None => return Err(Error::UnknownTarget(name)),
                    }
                }
                "-B" | "--debug" => {
                    if cli.debug {
                        return Err(Error::AlreadyGiven("Debug flag"));
                    }
                    cli.debug = true
                }
                unknown if unknown.starts_with('-') && unknown.len() > 1 => {
                    return Err(Error::Unknown {
                        arg: unknown.to_string(),
                        guess: best_guess(unknown),
                    });
                }
                _ => {
                    if listing.is_some() {
                        return Err(Error::AlreadyGiven("Path to listing"));
                    }
                    listing = Some(PathBuf::from(arg));
                }
            }
        }

        cli.listing = listing.ok_or(Error::MissingListing)?;
        Ok(cli)
    }

    fn validate_args(&self) {
        // stdin
        if self.listing != std::path::Path::new("-") && !self.listing.exists() {
            exit!(1 => "Listing {:?} does not exist.", self.listing);
        }

        if let Some(ref image) = self.image {
            if !image.exists() {
                exit!(1 => "Image {image:?} does not exist.");
            }
        }

        if let Some(ref cfg) = self.config {
            if !cfg.exists() {
                exit!(1 => "Config {cfg:?} does not exist.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, Error> {
        Cli::parse_from(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn listing_only() {
        let cli = parse(&["symbols.txt"]).unwrap();
        assert_eq!(cli.listing, PathBuf::from("symbols.txt"));
        assert_eq!(cli.image, None);
        assert_eq!(cli.target, None);
        assert!(!cli.debug);
    }

    #[test]
    fn all_options() {
        let cli = parse(&[
            "-I", "app.exe", "--output", "out.txt", "-C", "cfg.yaml", "--target", "x64", "-B",
            "symbols.txt",
        ])
        .unwrap();

        assert_eq!(cli.listing, PathBuf::from("symbols.txt"));
        assert_eq!(cli.image, Some(PathBuf::from("app.exe")));
        assert_eq!(cli.output, Some(PathBuf::from("out.txt")));
        assert_eq!(cli.config, Some(PathBuf::from("cfg.yaml")));
        assert_eq!(cli.target, Some(Target::X64));
        assert!(cli.debug);
    }

    #[test]
    fn errors() {
        assert_eq!(parse(&["-H"]), Err(Error::Help));
        assert_eq!(parse(&[]), Err(Error::MissingListing));
        assert_eq!(parse(&["a.txt", "b.txt"]), Err(Error::AlreadyGiven("Path to listing")));
        assert_eq!(parse(&["a.txt", "-B", "-B"]), Err(Error::AlreadyGiven("Debug flag")));
        assert_eq!(parse(&["a.txt", "--image"]), Err(Error::MissingValue("--image")));
        assert_eq!(parse(&["--image", "-B", "a.txt"]), Err(Error::MissingValue("--image")));
        assert_eq!(
            parse(&["a.txt", "-T", "arm"]),
            Err(Error::UnknownTarget("arm".to_string()))
        );
    }

    #[test]
    fn suggestions() {
        assert_eq!(
            parse(&["--imag", "a.exe"]),
            Err(Error::Unknown { arg: "--imag".to_string(), guess: Some("--image") })
        );
        assert_eq!(
            parse(&["--completely-wrong"]),
            Err(Error::Unknown { arg: "--completely-wrong".to_string(), guess: None })
        );
    }

    #[test]
    fn dash_is_a_listing() {
        assert_eq!(parse(&["-"]).unwrap().listing, PathBuf::from("-"));
    }
}
