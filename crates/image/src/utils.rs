// Copyright (c) 2025 Hemashushu <hippospark@gmail.com>, All rights reserved.
//
// This Source Code Form is subject to the terms of
// the Mozilla Public License version 2.0 and additional exceptions.
// For more details, see the LICENSE, LICENSE.additional, and CONTRIBUTING files.

use crate::program::{FunctionEntry, NativeEntry, Program};

/// The version word written by the builders below; the machine itself
/// does not interpret it.
pub const DEFAULT_VERSION: u16 = 0x13;

/// helper function for unit test
pub fn helper_build_program_with_single_function(
    num_args: u16,
    num_vars: u16,
    code: Vec<u8>,
) -> Program {
    helper_build_program_with_functions(vec![FunctionEntry {
        num_args,
        num_vars,
        code,
    }])
}

/// helper function for unit test
pub fn helper_build_program_with_functions(function_pool: Vec<FunctionEntry>) -> Program {
    helper_build_program(vec![], vec![], function_pool, vec![])
}

/// helper function for unit test
pub fn helper_build_program(
    int_pool: Vec<i32>,
    string_pool: Vec<u8>,
    function_pool: Vec<FunctionEntry>,
    native_pool: Vec<NativeEntry>,
) -> Program {
    Program {
        version: DEFAULT_VERSION,
        int_pool,
        string_pool,
        function_pool,
        native_pool,
    }
}

/// Concatenates strings into one NUL-terminated pool buffer and
/// returns the byte offset of each entry, ready for `aldc`.
pub fn helper_build_string_pool(strings: &[&str]) -> (Vec<u8>, Vec<u16>) {
    let mut pool = Vec::new();
    let mut offsets = Vec::with_capacity(strings.len());
    for string in strings {
        offsets.push(pool.len() as u16);
        pool.extend_from_slice(string.as_bytes());
        pool.push(0);
    }
    (pool, offsets)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::utils::helper_build_string_pool;

    #[test]
    fn test_build_string_pool() {
        let (pool, offsets) = helper_build_string_pool(&["ab", "", "c"]);
        assert_eq!(pool, b"ab\0\0c\0".to_vec());
        assert_eq!(offsets, vec![0, 3, 4]);
    }
}
