pub mod errordialog;
