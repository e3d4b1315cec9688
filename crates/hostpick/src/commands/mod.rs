//! Command implementations

pub mod arm;

pub mod doctor;

pub mod info;

pub mod init;

pub mod targets;
