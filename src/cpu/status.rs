use bitflags::bitflags;

bitflags! {
  // NV-BDIZC
  pub struct Status: u8 {
    const CARRY = 0b00000001;
    const ZERO = 0b00000010;
    const INTERRUPT_DISABLE = 0b00000100;
    const DECIMAL_MODE = 0b00001000;
    const BREAK_CMD = 0b00010000;
    const UNUSED = 0b00100000;
    const OVERFLOW = 0b01000000;
    const NEGATIVE = 0b10000000;
    // power-up and reset value
    const RESET = Self::INTERRUPT_DISABLE.bits | Self::UNUSED.bits;
  }
}

impl Status {
  pub fn update_zero_and_negative(&mut self, result: u8) {
    self.set(Status::ZERO, result == 0);
    self.set(Status::NEGATIVE, result & 0x80 != 0);
  }

  /// The byte PHP/BRK push (`brk == true`) or an interrupt pushes.
  pub fn pushed(&self, brk: bool) -> u8 {
    let mut pushed = *self | Status::UNUSED;
    pushed.set(Status::BREAK_CMD, brk);
    pushed.bits()
  }

  /// PLP/RTI: B has no storage, U always reads back set.
  pub fn pulled(value: u8) -> Status {
    let mut status = Status::from_bits_truncate(value);
    status.remove(Status::BREAK_CMD);
    status.insert(Status::UNUSED);
    status
  }
}
