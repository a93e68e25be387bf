// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the error taxonomy of the optimization layer.
//!
//! Every variant is a wiring bug between the optimizer and its host. Expected
//! runtime absences (cache misses, empty cells, empty sample series) are not
//! errors and never show up here.

use std::fmt;

/// A specialized `Result` type for optimizer operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

/// An error raised by the optimizer when it is misused by its host.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// `acquire`/`release` referenced a pool that was never initialized.
    UnknownPoolType {
        /// The pool name that was looked up.
        pool: String,
    },
    /// An object was released that the pool did not consider checked out.
    NotInUse {
        /// The pool the object was released to.
        pool: String,
    },
    /// A pool was accessed with a different object type than it was created with.
    PoolTypeMismatch {
        /// The pool name that was looked up.
        pool: String,
        /// The Rust type the caller asked for.
        expected: &'static str,
    },
    /// A cache namespace was written with a different key/value type than it holds.
    NamespaceTypeMismatch {
        /// The offending namespace.
        namespace: String,
        /// The Rust value type the caller used.
        expected: &'static str,
    },
    /// A size, capacity or duration was out of range.
    InvalidConfiguration(String),
    /// An interception point was wrapped a second time.
    AlreadyIntercepted {
        /// The `<label>.<method>` point that is already wrapped.
        point: String,
    },
}

impl fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerError::UnknownPoolType { pool } => {
                write!(f, "Object pool '{pool}' was never initialized")
            }
            OptimizerError::NotInUse { pool } => {
                write!(f, "Object released to pool '{pool}' is not checked out")
            }
            OptimizerError::PoolTypeMismatch { pool, expected } => {
                write!(f, "Object pool '{pool}' does not hold objects of type {expected}")
            }
            OptimizerError::NamespaceTypeMismatch {
                namespace,
                expected,
            } => {
                write!(
                    f,
                    "Cache namespace '{namespace}' does not hold values of type {expected}"
                )
            }
            OptimizerError::InvalidConfiguration(msg) => {
                write!(f, "Invalid optimizer configuration: {msg}")
            }
            OptimizerError::AlreadyIntercepted { point } => {
                write!(f, "Interception point '{point}' is already wrapped")
            }
        }
    }
}

impl std::error::Error for OptimizerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offender() {
        let err = OptimizerError::UnknownPoolType {
            pool: "projectile".to_string(),
        };
        assert!(err.to_string().contains("projectile"));

        let err = OptimizerError::AlreadyIntercepted {
            point: "board.add_entity".to_string(),
        };
        assert!(err.to_string().contains("board.add_entity"));

        let err = OptimizerError::InvalidConfiguration("cell size must be positive".into());
        assert_eq!(
            err.to_string(),
            "Invalid optimizer configuration: cell size must be positive"
        );
    }
}
