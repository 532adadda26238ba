use std::{ffi::OsString, path::PathBuf};

use structopt::{clap::AppSettings, StructOpt};

use super::{RunError, RunResult};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "s3-bucket-demo",
    about = "create a bucket, upload a file into it, list it and delete the bucket again",
    setting = AppSettings::AllowLeadingHyphen
)]
pub struct Args {
    /// Name of the bucket to create then delete, e.g. my-test-bucket
    #[structopt()]
    pub bucket: String,

    /// Local file to upload, the path as given is used as the object key
    #[structopt(parse(from_os_str), allow_hyphen_values = true)]
    pub file: PathBuf,

    #[structopt(hidden = true, parse(from_os_str), allow_hyphen_values = true)]
    extra: Vec<OsString>,
}

impl Args {
    /// Parses `args`, the first item being the program name.
    pub fn try_from_args<I>(args: I) -> RunResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<OsString> + Clone,
    {
        let args = Self::from_iter_safe(args).map_err(RunError::Argument)?;
        if !args.extra.is_empty() {
            tracing::debug!(ignored = ?args.extra, "ignoring trailing arguments");
        }
        Ok(args)
    }
}
