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

//! Identifiers for timing channels.

use std::fmt::{self, Display};

/// A named stream of timing samples.
///
/// The three frame-level channels are fixed; everything else (intercepted
/// host methods, registered subsystems) is a named subsystem channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Whole-frame duration, fed by the per-frame tick.
    Frame,
    /// Duration of the update pass.
    Update,
    /// Duration of the draw pass.
    Draw,
    /// A host subsystem or intercepted method.
    Subsystem(String),
}

impl Channel {
    /// Convenience constructor for a subsystem channel.
    pub fn subsystem(name: impl Into<String>) -> Self {
        Channel::Subsystem(name.into())
    }

    /// The display name of the channel.
    pub fn name(&self) -> &str {
        match self {
            Channel::Frame => "frame",
            Channel::Update => "update",
            Channel::Draw => "draw",
            Channel::Subsystem(name) => name,
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::Frame.name(), "frame");
        assert_eq!(Channel::Update.to_string(), "update");
        assert_eq!(Channel::subsystem("board.move_entity").name(), "board.move_entity");
        assert_ne!(Channel::subsystem("draw"), Channel::Draw);
    }
}
