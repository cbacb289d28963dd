use crate::Opcode;

/// Positions of the `JUMPDEST` bytes that are opcodes rather than push data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Valids(Vec<bool>);

impl Valids {
	#[must_use]
	pub fn new(code: &[u8]) -> Self {
		let mut valids = vec![false; code.len()];
		let mut position = 0;

		while let Some(&byte) = code.get(position) {
			let opcode = Opcode(byte);
			valids[position] = opcode == Opcode::JUMPDEST;
			position += 1 + opcode.is_push().map_or(0, usize::from);
		}

		Self(valids)
	}

	#[must_use]
	pub fn is_valid(&self, position: usize) -> bool {
		self.0.get(position).copied().unwrap_or(false)
	}
}
