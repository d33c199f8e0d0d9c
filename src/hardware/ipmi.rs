pub mod ipmi_backend;
