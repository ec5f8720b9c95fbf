/// Unwraps a `Result<T, E>` inside a function returning `Option<Result<T, E>>`.
///
/// `Ok(t)` yields `t`; `Err(e)` makes the enclosing function return `Some(Err(e))`.
///
/// Intended for `Iterator<Item = Result<T, E>>::next()` implementations that
/// call fallible helpers, such as the chunk iterator that normalizes raw chunk
/// inputs while walking the chunk list.
#[macro_export]
macro_rules! try_or_ret_some_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(err) => {
                return Some(Err(err.into()));
            }
        }
    };
}

/// Returns early with an index error when `$index` is negative.
///
/// Global positions in a chunked array never wrap around, so a negative
/// position is rejected before any chunk is touched.
#[macro_export]
macro_rules! reject_negative {
    ($index:expr) => {{
        let index: i64 = $index;
        if index < 0 {
            return Err($crate::error::ErrorKind::NegativeIndex { index }.into());
        }
        index as usize
    }};
}
