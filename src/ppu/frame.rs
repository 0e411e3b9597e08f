pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;
pub const FRAME_BYTES: usize = WIDTH * HEIGHT * 3;

/// Packed RGB24, row-major.
pub struct Frame {
    data: Box<[u8; FRAME_BYTES]>,
}

impl Frame {
    pub fn new() -> Frame {
        Frame {
            data: Box::new([0; FRAME_BYTES]),
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: (u8, u8, u8)) {
        let addr = (y * WIDTH + x) * 3;
        self.data[addr] = rgb.0;
        self.data[addr + 1] = rgb.1;
        self.data[addr + 2] = rgb.2;
    }

    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let addr = (y * WIDTH + x) * 3;
        (self.data[addr], self.data[addr + 1], self.data[addr + 2])
    }

    pub fn fill_row(&mut self, y: usize, rgb: (u8, u8, u8)) {
        (0..WIDTH).for_each(|x| self.set_pixel(x, y, rgb))
    }

    pub fn data(&self) -> &[u8; FRAME_BYTES] {
        &self.data
    }
}

impl Default for Frame {
    fn default() -> Self {
        Frame::new()
    }
}
