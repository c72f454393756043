//! Raw punch sources feeding a sync pass.

pub mod csv;
pub mod vec;

pub use self::csv::CsvPunchSource;
pub use self::vec::VecPunchSource;
