mod lab;

pub use lab::LabError;
