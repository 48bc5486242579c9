/// A value from an upstream pipeline stage that may or may not be present
/// this cycle. The producer writes a fresh value each cycle and clears the
/// port when its data stops (sensor dropout, stage disabled, not yet started).
/// A written value stays present until cleared.
///
/// Single writer, single reader, both in the control loop context. No
/// synchronization is provided or needed.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct InputPort<T: Copy> {
  value: Option<T>,
}

impl<T: Copy> InputPort<T> {
  pub fn new() -> Self {
    InputPort { value: None }
  }

  /// publish a new value on the port
  pub fn write(&mut self, value: T) {
    self.value = Some(value);
  }

  /// mark the port as having no data, until the next write
  pub fn clear(&mut self) {
    self.value = None;
  }

  /// the current value, or None when the source is not producing
  pub fn present(&self) -> Option<T> {
    self.value
  }

  pub fn is_present(&self) -> bool {
    self.value.is_some()
  }
}
