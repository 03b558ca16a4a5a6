use regex;
use reqwest;
use serde_json;
use std::fmt;

pub enum Error {
  String(String),
  SerdeJson(serde_json::Error),
  IoError(std::io::Error),
  Reqwest(reqwest::Error),
  Regex(regex::Error),
  Annotated(AnnotatedE),
}

pub struct AnnotatedE {
  pub error: Box<Error>,
  pub source: Box<Error>,
}

pub fn annotate(e: Error, source: Error) -> Error {
  Error::Annotated(AnnotatedE {
    error: Box::new(e),
    source: Box::new(source),
  })
}

pub fn annotate_string(s: String, source: Error) -> Error {
  annotate(Error::String(s), source)
}

impl fmt::Display for AnnotatedE {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} \n source: {}", self.error, self.source)
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    None
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self {
      Error::String(e) => write!(f, "{}", e),
      Error::SerdeJson(e) => write!(f, "{}", e),
      Error::IoError(e) => write!(f, "{}", e),
      Error::Reqwest(e) => write!(f, "{}", e),
      Error::Regex(e) => write!(f, "{}", e),
      Error::Annotated(e) => write!(f, "{}", e),
    }
  }
}

impl fmt::Debug for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self {
      Error::String(e) => write!(f, "{}", e),
      Error::SerdeJson(e) => write!(f, "{}", e),
      Error::IoError(e) => write!(f, "{}", e),
      Error::Reqwest(e) => write!(f, "{}", e),
      Error::Regex(e) => write!(f, "{}", e),
      Error::Annotated(e) => write!(f, "{}", e),
    }
  }
}

impl From<String> for Error {
  fn from(s: String) -> Self {
    Error::String(s)
  }
}

impl From<&str> for Error {
  fn from(s: &str) -> Self {
    Error::String(s.to_string())
  }
}

impl From<serde_json::Error> for Error {
  fn from(e: serde_json::Error) -> Self {
    Error::SerdeJson(e)
  }
}

impl From<std::io::Error> for Error {
  fn from(e: std::io::Error) -> Self {
    Error::IoError(e)
  }
}

impl From<reqwest::Error> for Error {
  fn from(e: reqwest::Error) -> Self {
    Error::Reqwest(e)
  }
}

impl From<regex::Error> for Error {
  fn from(e: regex::Error) -> Self {
    Error::Regex(e)
  }
}
