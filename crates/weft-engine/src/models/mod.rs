pub mod template_file;

pub use template_file::TemplateFile;
