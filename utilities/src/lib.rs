pub mod line_transport;
