use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Configuration,
    /// A source or output directory can't be used.
    #[display("cannot use directory {}", _0.display())]
    Directory(#[error(not(source))] PathBuf),
    #[display("build failed")]
    Build,
    #[display("could not write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    #[display("could not watch for changes")]
    Watch,
}
