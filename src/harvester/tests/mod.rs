mod community;
mod keyword;
