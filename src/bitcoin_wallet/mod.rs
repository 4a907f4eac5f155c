pub mod constants;
pub mod input_data;
pub mod report;
pub mod tx_details;
