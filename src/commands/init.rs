//! Initialize a new blog directory

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::{ACCESS_TOKEN_ENV, ENDPOINT_ENV};

/// Initialize a new site in the given directory. An existing
/// `_config.yml` is left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("static/images"))?;
    fs::create_dir_all(target_dir.join("languages"))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        tracing::warn!("{:?} already exists, keeping it", config_path);
        return Ok(());
    }

    let config_content = format!(
        r#"# Site
title: spacetraveling
description: ''
author: ''
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public
static_dir: static
i18n_dir: languages

# Date format
date_format: DD MMM YYYY

# Prismic repository
# {endpoint_env} and {token_env} override the values below
cms:
  endpoint: ''
  access_token:
  document_type: posts
  page_size: 2
"#,
        endpoint_env = ENDPOINT_ENV,
        token_env = ACCESS_TOKEN_ENV,
    );

    fs::write(&config_path, config_content)?;

    Ok(())
}
