// CloudJukebox - Music archive and playback over object storage
// Copyright (C) 2025 CloudJukebox Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Encryption for CloudJukebox song objects
//!
//! Songs in `-e` and `-ez` containers are encrypted with the archive's legacy
//! block cipher scheme, see [`cipher`].

pub mod cipher;

pub use cipher::{
    pad_count, Encrypted, EncryptionError, LegacyCipher, BLOCK_SIZE, IV_PAD_CHAR, KEY_PAD_CHAR,
    KEY_SIZE,
};
