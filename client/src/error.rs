// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never got an answer (connection refused, timeout, bad body).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status other than 404.
    #[error("Server answered {status}: {message}")]
    Api { status: u16, message: String },

    /// A mutation of this kind is still in flight; its control should be disabled.
    #[error("A {0} is already in progress.")]
    MutationPending(&'static str),
}

pub type Result<T> = std::result::Result<T, ClientError>;
