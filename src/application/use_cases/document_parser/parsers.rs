mod csv;
mod docx;
mod pdf;
mod txt;
mod xlsx;
