pub mod cli_trainer;
