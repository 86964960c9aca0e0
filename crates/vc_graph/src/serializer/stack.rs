use alloc::vec::Vec;
use core::fmt::{Debug, Formatter};

use log::debug;

use crate::Error;

/// The chain of types being converted, logged with the first hard failure.
#[derive(Default, Clone)]
pub(super) struct TypeStack {
    stack: Vec<&'static str>,
    reported: bool,
}

impl TypeStack {
    pub fn push(&mut self, type_name: &'static str) {
        self.stack.push(type_name);
    }

    /// Pops the innermost type, logging `error` if it is the first failure
    /// seen since the stack was last empty.
    pub fn pop(&mut self, error: Option<&Error>) {
        if let Some(error) = error
            && !self.reported
        {
            self.reported = true;
            debug!("{error} (stack:\n{self:?})");
        }
        self.stack.pop();
        if self.stack.is_empty() {
            self.reported = false;
        }
    }
}

impl Debug for TypeStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut iter = self.stack.iter();

        if let Some(first) = iter.next() {
            writeln!(f, "`{first}`")?;
        }

        for name in iter {
            writeln!(f, " -> `{name}`")?;
        }

        Ok(())
    }
}
